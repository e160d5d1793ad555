//! Pluggable bearer-token cache for practice-management API clients.
//!
//! A [`TokenCache`](cache::TokenCache) persists one bearer token and its expiry across process
//! invocations and reports `NotExist`/`Expired` as typed errors so callers know when to log in
//! again. [`TokenSource`](source::TokenSource) wraps that decision and collapses concurrent
//! re-authentication into a single issuer call.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod cache;
pub mod error;
pub mod obs;
pub mod source;
pub mod token;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for tests; enabled via `cfg(test)` or the `test` crate
	//! feature.

	pub use crate::_prelude::*;

	// std
	use std::{env, fs, io::ErrorKind, process};

	/// Builds a unique cache file path under the system temp directory.
	pub fn temp_cache_path(label: &str) -> PathBuf {
		let unique = format!(
			"practice_token_cache_{label}_{}_{}.json",
			process::id(),
			OffsetDateTime::now_utc().unix_timestamp_nanos(),
		);

		env::temp_dir().join(unique)
	}

	/// Removes a cache file produced by a test, tolerating files that were never written.
	pub fn remove_cache_file(path: &Path) {
		match fs::remove_file(path) {
			Ok(()) => (),
			Err(e) if e.kind() == ErrorKind::NotFound => (),
			Err(e) => panic!("Failed to remove temporary token cache {}: {e}", path.display()),
		}
	}
}

mod _prelude {
	pub use std::{
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		path::{Path, PathBuf},
		pin::Pin,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::Mutex;
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};

	pub use crate::error::{BoxError, Error, Result};
}

pub use time;
