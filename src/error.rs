//! Crate-level error types shared by caches and token sources.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Boxed error produced by caller-supplied token issuers.
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Canonical error exposed by [`TokenSource`](crate::source::TokenSource).
#[derive(Debug, ThisError)]
pub enum Error {
	/// Token cache failure, including the `NotExist`/`Expired` signals.
	#[error("{0}")]
	Cache(
		#[from]
		#[source]
		crate::cache::CacheError,
	),
	/// Re-authentication failed inside the caller-supplied issuer.
	#[error("Token issuer failed to produce a token.")]
	Issuer {
		/// Underlying issuer failure.
		#[source]
		source: BoxError,
	},
}
impl Error {
	/// Wraps an issuer failure inside [`Error`].
	pub fn issuer(source: BoxError) -> Self {
		Self::Issuer { source }
	}

	/// Returns the cache error, if this failure originated in the token cache.
	pub fn as_cache(&self) -> Option<&crate::cache::CacheError> {
		match self {
			Self::Cache(e) => Some(e),
			Self::Issuer { .. } => None,
		}
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::io;
	// self
	use super::*;
	use crate::cache::CacheError;

	#[test]
	fn cache_error_converts_with_source() {
		let cache_error = CacheError::Storage { message: "disk full".into() };
		let error: Error = cache_error.clone().into();

		assert_eq!(error.as_cache(), Some(&cache_error));
		assert!(error.to_string().contains("disk full"));

		let source =
			StdError::source(&error).expect("Cache errors should be exposed as the source.");

		assert_eq!(source.to_string(), cache_error.to_string());
	}

	#[test]
	fn issuer_error_keeps_source() {
		let error = Error::issuer(Box::new(io::Error::other("login rejected")));

		assert!(error.as_cache().is_none());
		assert_eq!(error.to_string(), "Token issuer failed to produce a token.");
		assert_eq!(
			StdError::source(&error)
				.expect("Issuer errors should expose the issuer failure.")
				.to_string(),
			"login rejected"
		);
	}
}
