//! Secure token secret wrapper that redacts sensitive material.

// crates.io
use sha2::{Digest, Sha256};
// self
use crate::_prelude::*;

/// Redacted bearer-token wrapper keeping sensitive material out of logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSecret(String);
impl TokenSecret {
	const FINGERPRINT_BYTES: usize = 6;

	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Consumes the wrapper and returns the raw token value.
	pub fn into_inner(self) -> String {
		self.0
	}

	/// Returns `true` when the wrapped token is the empty string.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Short SHA-256 prefix that identifies the token in logs without revealing it.
	pub fn fingerprint(&self) -> String {
		let digest = Sha256::digest(self.0.as_bytes());

		digest.iter().take(Self::FINGERPRINT_BYTES).map(|b| format!("{b:02x}")).collect()
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn secret_formatters_redact() {
		let secret = TokenSecret::new("super-secret");

		assert_eq!(format!("{secret:?}"), "TokenSecret(\"<redacted>\")");
		assert_eq!(format!("{secret}"), "<redacted>");
	}

	#[test]
	fn fingerprint_is_stable_and_does_not_leak() {
		let secret = TokenSecret::new("abc123");
		let fingerprint = secret.fingerprint();

		assert_eq!(fingerprint.len(), 12);
		assert_eq!(fingerprint, TokenSecret::new("abc123").fingerprint());
		assert_ne!(fingerprint, TokenSecret::new("abc124").fingerprint());
		assert!(!fingerprint.contains("abc123"));
	}

	#[test]
	fn serializes_as_plain_string() {
		let payload = serde_json::to_string(&TokenSecret::new("abc123"))
			.expect("Token secrets should serialize to JSON.");

		assert_eq!(payload, "\"abc123\"");
	}
}
