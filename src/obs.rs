//! Optional observability helpers for cache operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` (default) to emit spans named `practice_token_cache.op` with the `op`,
//!   `backend` and `outcome` fields, plus one event per completed operation. Token values never
//!   reach logs; use
//!   [`TokenSecret::fingerprint`](crate::token::TokenSecret::fingerprint) to correlate them.
//! - Enable `metrics` to increment the `practice_token_cache_op_total` counter for every
//!   completed operation, labeled by `op`, `backend`, and `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::{_prelude::*, cache::CacheError};

/// Operations observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CacheOp {
	/// [`TokenCache::get`](crate::cache::TokenCache::get).
	Get,
	/// [`TokenCache::set`](crate::cache::TokenCache::set).
	Set,
	/// Re-authentication through a [`TokenIssuer`](crate::source::TokenIssuer).
	Refresh,
}
impl CacheOp {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CacheOp::Get => "get",
			CacheOp::Set => "set",
			CacheOp::Refresh => "refresh",
		}
	}
}
impl Display for CacheOp {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Component that performed an operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CacheBackend {
	/// [`FileTokenCache`](crate::cache::FileTokenCache).
	File,
	/// [`MemoryTokenCache`](crate::cache::MemoryTokenCache).
	Memory,
	/// [`TokenSource`](crate::source::TokenSource).
	Source,
}
impl CacheBackend {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CacheBackend::File => "file",
			CacheBackend::Memory => "memory",
			CacheBackend::Source => "source",
		}
	}
}
impl Display for CacheBackend {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each completed operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpOutcome {
	/// A valid token was handed out.
	Hit,
	/// No usable token was cached.
	Miss,
	/// A token was cached but had expired.
	Expired,
	/// A token was written.
	Stored,
	/// Operational failure propagated back to the caller.
	Failure,
}
impl OpOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpOutcome::Hit => "hit",
			OpOutcome::Miss => "miss",
			OpOutcome::Expired => "expired",
			OpOutcome::Stored => "stored",
			OpOutcome::Failure => "failure",
		}
	}

	/// Classifies a cache result, labeling `Ok` values with `success`.
	pub fn of<T>(result: &Result<T, CacheError>, success: OpOutcome) -> Self {
		match result {
			Ok(_) => success,
			Err(CacheError::NotExist) => OpOutcome::Miss,
			Err(CacheError::Expired) => OpOutcome::Expired,
			Err(_) => OpOutcome::Failure,
		}
	}
}
impl Display for OpOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
