//! Token cache contract and built-in cache implementations.
//!
//! API clients depend only on [`TokenCache`]: `get` hands back a still-valid bearer token or a
//! typed [`CacheError`], `set` persists a token with its expiry. [`CacheError::requires_refresh`]
//! separates the "go re-authenticate" signals from operational faults.

pub mod file;
pub mod memory;

pub use file::{FileTokenCache, FileTokenCacheBuilder, WriteStrategy};
pub use memory::MemoryTokenCache;

// self
use crate::{_prelude::*, token::TokenSecret};

/// Storage contract implemented by bearer-token caches.
///
/// Implementations hold at most one record; every `set` replaces it wholesale. Both calls are
/// synchronous and must be safe to invoke concurrently through a shared reference.
pub trait TokenCache
where
	Self: Send + Sync,
{
	/// Returns the cached token if one is present and unexpired.
	fn get(&self) -> Result<TokenSecret, CacheError>;

	/// Persists `token` with its expiry, replacing any prior record.
	fn set(&self, token: &str, expires_at: OffsetDateTime) -> Result<(), CacheError>;
}
impl<T> TokenCache for Arc<T>
where
	T: ?Sized + TokenCache,
{
	fn get(&self) -> Result<TokenSecret, CacheError> {
		(**self).get()
	}

	fn set(&self, token: &str, expires_at: OffsetDateTime) -> Result<(), CacheError> {
		(**self).set(token, expires_at)
	}
}

/// Error type produced by [`TokenCache`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum CacheError {
	/// No usable token is cached (never stored, absent, empty, or stored with an empty token).
	#[error("Cached token does not exist.")]
	NotExist,
	/// A token is cached but its expiry is at or before the current time.
	#[error("Cached token has expired.")]
	Expired,
	/// The backing store could not be read or written.
	#[error("Storage error: {message}.")]
	Storage {
		/// Human-readable error payload.
		message: String,
	},
	/// Persisted content is malformed or an outgoing record could not be encoded.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Caller attempted to store an empty token.
	#[error("Refusing to cache an empty token.")]
	EmptyToken,
}
impl CacheError {
	/// Returns `true` when the caller should re-authenticate and call `set` again.
	pub fn requires_refresh(&self) -> bool {
		matches!(self, Self::NotExist | Self::Expired)
	}
}
