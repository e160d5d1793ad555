//! The persisted `{token, expiresAt}` record and its lifecycle helpers.

// self
use crate::{_prelude::*, cache::CacheError, token::TokenSecret};

/// Lifecycle status of a cached token at a given instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenStatus {
	/// Token is usable; its expiry lies strictly after the instant.
	Active,
	/// Token reached or passed its expiry instant.
	Expired,
}

/// Single bearer token plus its expiry, exactly as written to a backing store.
///
/// The JSON shape is `{"token": "<string>", "expiresAt": "<RFC3339>"}`; unknown fields are
/// ignored when reading.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedToken {
	/// Bearer token secret; callers must avoid logging it.
	pub token: TokenSecret,
	/// Instant at which the token stops being valid.
	#[serde(with = "time::serde::rfc3339")]
	pub expires_at: OffsetDateTime,
}
impl CachedToken {
	/// Builds a record, rejecting empty tokens.
	pub fn new(token: impl Into<String>, expires_at: OffsetDateTime) -> Result<Self, CacheError> {
		let token = TokenSecret::new(token);

		if token.is_empty() {
			return Err(CacheError::EmptyToken);
		}

		Ok(Self { token, expires_at })
	}

	/// Computes the lifecycle status at a given instant.
	pub fn status_at(&self, instant: OffsetDateTime) -> TokenStatus {
		if instant >= self.expires_at { TokenStatus::Expired } else { TokenStatus::Active }
	}

	/// Returns `true` if the record has expired at the provided instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		matches!(self.status_at(instant), TokenStatus::Expired)
	}

	/// Returns `true` if the record is expired relative to the current clock.
	pub fn is_expired(&self) -> bool {
		self.is_expired_at(OffsetDateTime::now_utc())
	}

	/// Resolves the record into the token a cache read should hand out at `instant`.
	///
	/// Empty tokens read back as [`CacheError::NotExist`]; stale ones as
	/// [`CacheError::Expired`].
	pub fn into_active_at(self, instant: OffsetDateTime) -> Result<TokenSecret, CacheError> {
		if self.token.is_empty() {
			return Err(CacheError::NotExist);
		}

		match self.status_at(instant) {
			TokenStatus::Active => Ok(self.token),
			TokenStatus::Expired => Err(CacheError::Expired),
		}
	}
}
