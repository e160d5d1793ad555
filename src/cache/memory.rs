//! Thread-safe in-memory [`TokenCache`] implementation for tests and short-lived processes.

// self
use crate::{
	_prelude::*,
	cache::{CacheError, TokenCache},
	obs::{self, CacheBackend, CacheOp, OpOutcome, OpSpan},
	token::{CachedToken, TokenSecret},
};

/// Cache that keeps the record in-process; clones share the same slot.
#[derive(Clone, Debug, Default)]
pub struct MemoryTokenCache(Arc<Mutex<Option<CachedToken>>>);
impl MemoryTokenCache {
	/// Returns a copy of the stored record, expired or not.
	pub fn snapshot(&self) -> Option<CachedToken> {
		self.0.lock().clone()
	}

	fn get_now(&self, now: OffsetDateTime) -> Result<TokenSecret, CacheError> {
		self.0.lock().clone().ok_or(CacheError::NotExist)?.into_active_at(now)
	}

	fn set_now(&self, record: CachedToken) {
		*self.0.lock() = Some(record);
	}
}
impl TokenCache for MemoryTokenCache {
	fn get(&self) -> Result<TokenSecret, CacheError> {
		let span = OpSpan::new(CacheOp::Get, CacheBackend::Memory).entered();
		let result = self.get_now(OffsetDateTime::now_utc());

		span.complete_cache(&result, OpOutcome::Hit);

		result
	}

	fn set(&self, token: &str, expires_at: OffsetDateTime) -> Result<(), CacheError> {
		let span = OpSpan::new(CacheOp::Set, CacheBackend::Memory).entered();
		let result = CachedToken::new(token, expires_at).map(|record| {
			obs::log_token_stored(CacheBackend::Memory, &record.token.fingerprint(), expires_at);

			self.set_now(record);
		});

		span.complete_cache(&result, OpOutcome::Stored);

		result
	}
}
