// self
use crate::obs::{CacheBackend, CacheOp, OpOutcome};

/// Records an operation outcome via the global metrics recorder (when enabled).
pub fn record_op_outcome(op: CacheOp, backend: CacheBackend, outcome: OpOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"practice_token_cache_op_total",
			"op" => op.as_str(),
			"backend" => backend.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (op, backend, outcome);
	}
}
