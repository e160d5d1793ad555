// self
use crate::{
	_prelude::*,
	cache::CacheError,
	obs::{self, CacheBackend, CacheOp, OpOutcome},
};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedOp<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedOp<F> = F;

/// Span covering one cache or source operation.
///
/// The span is opened with its `outcome` field empty; [`OpSpan::complete`] (or
/// [`OpSpanGuard::complete`] for synchronous sections) fills it in, bumps the operation counter
/// and emits the completion event inside the span.
#[derive(Clone, Debug)]
pub struct OpSpan {
	op: CacheOp,
	backend: CacheBackend,
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl OpSpan {
	/// Opens a span for `op` performed by `backend`.
	pub fn new(op: CacheOp, backend: CacheBackend) -> Self {
		Self {
			op,
			backend,
			#[cfg(feature = "tracing")]
			span: tracing::debug_span!(
				"practice_token_cache.op",
				op = op.as_str(),
				backend = backend.as_str(),
				outcome = tracing::field::Empty,
			),
		}
	}

	/// Operation this span covers.
	pub fn op(&self) -> CacheOp {
		self.op
	}

	/// Backend performing the operation.
	pub fn backend(&self) -> CacheBackend {
		self.backend
	}

	/// Enters the span for synchronous sections.
	pub fn entered(self) -> OpSpanGuard {
		OpSpanGuard {
			op: self.op,
			backend: self.backend,
			#[cfg(feature = "tracing")]
			guard: self.span.entered(),
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedOp<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}

	/// Records the final outcome of an instrumented operation.
	pub fn complete(&self, outcome: OpOutcome, error: Option<&dyn Display>) {
		#[cfg(feature = "tracing")]
		{
			self.span.record("outcome", outcome.as_str());

			let _entered = self.span.enter();

			finish(self.op, self.backend, outcome, error);
		}
		#[cfg(not(feature = "tracing"))]
		{
			finish(self.op, self.backend, outcome, error);
		}
	}
}

/// RAII guard returned by [`OpSpan::entered`].
pub struct OpSpanGuard {
	op: CacheOp,
	backend: CacheBackend,
	#[cfg(feature = "tracing")]
	guard: tracing::span::EnteredSpan,
}
impl OpSpanGuard {
	/// Records the final outcome of the entered operation.
	pub fn complete(&self, outcome: OpOutcome, error: Option<&dyn Display>) {
		#[cfg(feature = "tracing")]
		self.guard.record("outcome", outcome.as_str());

		finish(self.op, self.backend, outcome, error);
	}

	/// Classifies a cache result, records it, and returns the outcome label used.
	pub fn complete_cache<T>(
		&self,
		result: &Result<T, CacheError>,
		success: OpOutcome,
	) -> OpOutcome {
		let outcome = OpOutcome::of(result, success);

		self.complete(outcome, result.as_ref().err().map(|e| e as &dyn Display));

		outcome
	}
}
impl Debug for OpSpanGuard {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("OpSpanGuard")
			.field("op", &self.op)
			.field("backend", &self.backend)
			.finish_non_exhaustive()
	}
}

/// Emits an event when a token lands in a backing store, identified by its fingerprint.
pub fn log_token_stored(backend: CacheBackend, fingerprint: &str, expires_at: OffsetDateTime) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(
			backend = backend.as_str(),
			fingerprint,
			expires_at = %expires_at,
			"Stored bearer token."
		);
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (backend, fingerprint, expires_at);
	}
}

// Failures log at `warn`; refresh signals (miss/expired) and successes at `debug`.
fn finish(op: CacheOp, backend: CacheBackend, outcome: OpOutcome, error: Option<&dyn Display>) {
	obs::record_op_outcome(op, backend, outcome);

	#[cfg(feature = "tracing")]
	{
		let (op, backend) = (op.as_str(), backend.as_str());

		match (outcome, error) {
			(OpOutcome::Failure, Some(error)) =>
				tracing::warn!(op, backend, %error, "Token cache operation failed."),
			(OpOutcome::Failure, None) =>
				tracing::warn!(op, backend, "Token cache operation failed."),
			_ => tracing::debug!(
				op,
				backend,
				outcome = outcome.as_str(),
				"Token cache operation completed."
			),
		}
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = error;
	}
}
