//! Cache-first token acquisition with single-flight re-authentication.
//!
//! [`TokenSource::token`] reads the [`TokenCache`] and only calls the caller's [`TokenIssuer`]
//! when the cache error [`requires_refresh`](crate::cache::CacheError::requires_refresh).
//! Concurrent callers that miss together wait on one guard; the first refreshes, the rest re-read
//! the cache and pick up its token. Storage and serialization faults are returned as-is and never
//! trigger a login.

// self
use crate::{
	_prelude::*,
	cache::TokenCache,
	obs::{CacheBackend, CacheOp, OpOutcome, OpSpan},
	token::TokenSecret,
};

// Latest instant that still renders as an RFC 3339 timestamp.
const LATEST_EXPIRY: OffsetDateTime = time::macros::datetime!(9999-12-31 23:59:59 UTC);

/// Boxed future returned by [`TokenIssuer::issue`].
pub type IssuerFuture<'a> =
	Pin<Box<dyn Future<Output = Result<IssuedToken, BoxError>> + 'a + Send>>;

/// Re-authentication step supplied by the API client (for example a client-credentials POST).
pub trait TokenIssuer
where
	Self: Send + Sync,
{
	/// Obtains a fresh bearer token from the upstream authorization server.
	fn issue(&self) -> IssuerFuture<'_>;
}

/// Token returned by a [`TokenIssuer`].
#[derive(Clone)]
pub struct IssuedToken {
	/// Raw bearer token.
	pub token: String,
	/// Instant at which the token stops being valid.
	pub expires_at: OffsetDateTime,
}
impl IssuedToken {
	/// Creates a token with an absolute expiry.
	pub fn new(token: impl Into<String>, expires_at: OffsetDateTime) -> Self {
		Self { token: token.into(), expires_at }
	}

	/// Creates a token that expires `lifetime` from now, as reported by `expires_in`.
	///
	/// Lifetimes past year 9999 are clamped to the last representable instant; negative lifetimes
	/// that underflow yield a token that is already expired.
	pub fn expiring_in(token: impl Into<String>, lifetime: Duration) -> Self {
		let now = OffsetDateTime::now_utc();
		let expires_at = match now.checked_add(lifetime) {
			Some(at) => at.min(LATEST_EXPIRY),
			None if lifetime.is_negative() => now,
			None => LATEST_EXPIRY,
		};

		Self::new(token, expires_at)
	}
}
impl Debug for IssuedToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("IssuedToken")
			.field("token", &"<redacted>")
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

/// Hands out bearer tokens from a cache, re-authenticating through an issuer when needed.
#[derive(Clone)]
pub struct TokenSource {
	cache: Arc<dyn TokenCache>,
	issuer: Arc<dyn TokenIssuer>,
	refresh_guard: Arc<AsyncMutex<()>>,
}
impl TokenSource {
	/// Creates a source over the provided cache + issuer pair.
	pub fn new(cache: Arc<dyn TokenCache>, issuer: Arc<dyn TokenIssuer>) -> Self {
		Self { cache, issuer, refresh_guard: Default::default() }
	}

	/// Cache backing this source.
	pub fn cache(&self) -> &Arc<dyn TokenCache> {
		&self.cache
	}

	/// Returns a valid token, re-authenticating only when the cache has none.
	pub async fn token(&self) -> Result<TokenSecret> {
		if let Some(token) = self.cached()? {
			return Ok(token);
		}

		let _singleflight = self.refresh_guard.lock().await;

		// Another caller may have refreshed while this one waited.
		if let Some(token) = self.cached()? {
			return Ok(token);
		}

		self.issue_locked().await
	}

	/// Replaces `rejected`, a token the API refused even though the cache considers it valid.
	///
	/// Callers that race on the same rejected token share one issuer call: once the guard is
	/// held, a cached token that differs from `rejected` is returned as the replacement.
	pub async fn refresh(&self, rejected: &TokenSecret) -> Result<TokenSecret> {
		let _singleflight = self.refresh_guard.lock().await;

		match self.cached()? {
			Some(token) if token != *rejected => Ok(token),
			_ => self.issue_locked().await,
		}
	}

	fn cached(&self) -> Result<Option<TokenSecret>> {
		match self.cache.get() {
			Ok(token) => Ok(Some(token)),
			Err(e) if e.requires_refresh() => Ok(None),
			Err(e) => Err(e.into()),
		}
	}

	async fn issue_locked(&self) -> Result<TokenSecret> {
		let span = OpSpan::new(CacheOp::Refresh, CacheBackend::Source);
		let result: Result<TokenSecret> = span
			.instrument(async {
				let issued = self.issuer.issue().await.map_err(Error::issuer)?;

				self.cache.set(&issued.token, issued.expires_at)?;

				Ok(TokenSecret::new(issued.token))
			})
			.await;

		match &result {
			Ok(_) => span.complete(OpOutcome::Stored, None),
			Err(e) => span.complete(OpOutcome::Failure, Some(e as &dyn Display)),
		}

		result
	}
}
impl Debug for TokenSource {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenSource").finish_non_exhaustive()
	}
}
