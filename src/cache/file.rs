//! File-backed [`TokenCache`] that survives process restarts.
//!
//! The file holds a single JSON record, `{"token": "...", "expiresAt": "<RFC3339>"}`, written
//! with owner-only permissions. One mutex per cache instance (shared by its clones) serializes
//! every `get` and `set`; nothing coordinates separate processes beyond the atomic rename used
//! by [`WriteStrategy::Atomic`].
//!
//! A backing file that does not exist reads as [`CacheError::NotExist`], the same as an empty
//! one. Every other read failure surfaces as [`CacheError::Storage`].

// std
use std::{
	ffi::OsString,
	fs::{self, File, OpenOptions},
	io::{ErrorKind, Write},
	process,
	sync::atomic::{AtomicU64, Ordering},
};
// self
use crate::{
	_prelude::*,
	cache::{CacheError, TokenCache},
	obs::{self, CacheBackend, CacheOp, OpOutcome, OpSpan},
	token::{CachedToken, TokenSecret},
};

#[cfg(unix)] const OWNER_READ_WRITE: u32 = 0o600;

static NEXT_TEMP_ID: AtomicU64 = AtomicU64::new(0);

/// How [`FileTokenCache::set`] replaces the backing file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WriteStrategy {
	/// Write a sibling temporary file, sync it, then rename it over the target.
	#[default]
	Atomic,
	/// Truncate the target and write the record in place.
	InPlace,
}

/// Builder for [`FileTokenCache`].
#[derive(Clone, Debug)]
pub struct FileTokenCacheBuilder {
	path: PathBuf,
	write_strategy: WriteStrategy,
	create_parent_dirs: bool,
}
impl FileTokenCacheBuilder {
	fn new(path: PathBuf) -> Self {
		Self { path, write_strategy: WriteStrategy::default(), create_parent_dirs: false }
	}

	/// Selects how writes replace the backing file (defaults to [`WriteStrategy::Atomic`]).
	pub fn write_strategy(mut self, strategy: WriteStrategy) -> Self {
		self.write_strategy = strategy;

		self
	}

	/// Creates missing parent directories before each write (off by default, in which case a
	/// missing directory is a storage failure).
	pub fn create_parent_dirs(mut self, enabled: bool) -> Self {
		self.create_parent_dirs = enabled;

		self
	}

	/// Consumes the builder and produces a [`FileTokenCache`].
	///
	/// # Panics
	///
	/// Panics if the path is empty; a cache without a location is a programming error.
	pub fn build(self) -> FileTokenCache {
		assert!(!self.path.as_os_str().is_empty(), "Token cache path is required.");

		FileTokenCache {
			path: self.path,
			write_strategy: self.write_strategy,
			create_parent_dirs: self.create_parent_dirs,
			lock: Default::default(),
		}
	}
}

/// Persists a single bearer token to a JSON file.
#[derive(Clone, Debug)]
pub struct FileTokenCache {
	path: PathBuf,
	write_strategy: WriteStrategy,
	create_parent_dirs: bool,
	lock: Arc<Mutex<()>>,
}
impl FileTokenCache {
	/// Creates a cache at `path` with default options.
	///
	/// # Panics
	///
	/// Panics if the path is empty.
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self::builder(path).build()
	}

	/// Returns a builder for configuring write behavior.
	pub fn builder(path: impl Into<PathBuf>) -> FileTokenCacheBuilder {
		FileTokenCacheBuilder::new(path.into())
	}

	/// Location of the backing file.
	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Strategy used to replace the backing file.
	pub fn write_strategy(&self) -> WriteStrategy {
		self.write_strategy
	}

	fn read_locked(&self) -> Result<TokenSecret, CacheError> {
		let _guard = self.lock.lock();
		let bytes = match fs::read(&self.path) {
			Ok(bytes) => bytes,
			Err(e) if e.kind() == ErrorKind::NotFound => return Err(CacheError::NotExist),
			Err(e) =>
				return Err(CacheError::Storage {
					message: format!("Failed to read {}: {e}", self.path.display()),
				}),
		};

		if bytes.iter().all(u8::is_ascii_whitespace) {
			return Err(CacheError::NotExist);
		}

		self.decode(&bytes)?.into_active_at(OffsetDateTime::now_utc())
	}

	fn decode(&self, bytes: &[u8]) -> Result<CachedToken, CacheError> {
		let unmarshal_error = |e: &dyn Display| CacheError::Serialization {
			message: format!("Failed to unmarshal token record from {}: {e}", self.path.display()),
		};
		let mut de = serde_json::Deserializer::from_slice(bytes);
		let record: CachedToken =
			serde_path_to_error::deserialize(&mut de).map_err(|e| unmarshal_error(&e))?;

		de.end().map_err(|e| unmarshal_error(&e))?;

		Ok(record)
	}

	fn write_locked(&self, record: &CachedToken) -> Result<(), CacheError> {
		let _guard = self.lock.lock();
		let serialized = serde_json::to_vec(record).map_err(|e| CacheError::Serialization {
			message: format!("Failed to marshal token record: {e}"),
		})?;

		if self.create_parent_dirs {
			Self::ensure_parent_exists(&self.path)?;
		}

		match self.write_strategy {
			WriteStrategy::Atomic => self.replace_atomically(&serialized),
			WriteStrategy::InPlace => Self::write_owner_only(&self.path, &serialized, false),
		}
	}

	fn replace_atomically(&self, contents: &[u8]) -> Result<(), CacheError> {
		let tmp_path = Self::temp_path(&self.path);
		let result = Self::write_owner_only(&tmp_path, contents, true).and_then(|()| {
			fs::rename(&tmp_path, &self.path).map_err(|e| CacheError::Storage {
				message: format!("Failed to replace {}: {e}", self.path.display()),
			})
		});

		if result.is_err() {
			// Best effort; the write error is what gets reported.
			let _ = fs::remove_file(&tmp_path);
		}

		result
	}

	fn write_owner_only(path: &Path, contents: &[u8], fresh: bool) -> Result<(), CacheError> {
		let mut options = OpenOptions::new();

		if fresh {
			// Never share a temp file with another writer, even on a name collision.
			options.write(true).create_new(true);
		} else {
			options.write(true).create(true).truncate(true);
		}

		#[cfg(unix)]
		{
			use std::os::unix::fs::OpenOptionsExt;

			options.mode(OWNER_READ_WRITE);
		}

		let mut file = options.open(path).map_err(|e| CacheError::Storage {
			message: format!("Failed to open {}: {e}", path.display()),
		})?;

		Self::restrict_permissions(&file, path)?;

		file.write_all(contents).map_err(|e| CacheError::Storage {
			message: format!("Failed to write {}: {e}", path.display()),
		})?;
		file.sync_all().map_err(|e| CacheError::Storage {
			message: format!("Failed to sync {}: {e}", path.display()),
		})
	}

	// `mode` only applies on creation; tighten files that already existed too.
	#[cfg(unix)]
	fn restrict_permissions(file: &File, path: &Path) -> Result<(), CacheError> {
		use std::os::unix::fs::PermissionsExt;

		file.set_permissions(fs::Permissions::from_mode(OWNER_READ_WRITE)).map_err(|e| {
			CacheError::Storage {
				message: format!("Failed to restrict permissions on {}: {e}", path.display()),
			}
		})
	}

	#[cfg(not(unix))]
	fn restrict_permissions(_: &File, _: &Path) -> Result<(), CacheError> {
		Ok(())
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), CacheError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| CacheError::Storage {
				message: format!("Failed to create cache directory {}: {e}", parent.display()),
			})?;
		}

		Ok(())
	}

	// Unique per write: separate instances, clones and processes may target the same file.
	fn temp_path(path: &Path) -> PathBuf {
		let mut name = path.file_name().map(OsString::from).unwrap_or_else(|| "token".into());

		name.push(format!(
			".{}.{}.{}.tmp",
			process::id(),
			NEXT_TEMP_ID.fetch_add(1, Ordering::Relaxed),
			OffsetDateTime::now_utc().unix_timestamp_nanos() % 1_000_000_000,
		));

		path.with_file_name(name)
	}
}
impl TokenCache for FileTokenCache {
	fn get(&self) -> Result<TokenSecret, CacheError> {
		let span = OpSpan::new(CacheOp::Get, CacheBackend::File).entered();
		let result = self.read_locked();

		span.complete_cache(&result, OpOutcome::Hit);

		result
	}

	fn set(&self, token: &str, expires_at: OffsetDateTime) -> Result<(), CacheError> {
		let span = OpSpan::new(CacheOp::Set, CacheBackend::File).entered();
		let result = CachedToken::new(token, expires_at).and_then(|record| {
			self.write_locked(&record)?;

			obs::log_token_stored(CacheBackend::File, &record.token.fingerprint(), expires_at);

			Ok(())
		});

		span.complete_cache(&result, OpOutcome::Stored);

		result
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::_preludet::{remove_cache_file, temp_cache_path};

	#[test]
	#[should_panic(expected = "Token cache path is required.")]
	fn empty_path_panics() {
		let _ = FileTokenCache::new("");
	}

	#[test]
	fn missing_file_reads_as_not_exist() {
		let cache = FileTokenCache::new(temp_cache_path("missing"));

		assert_eq!(cache.get(), Err(CacheError::NotExist));
	}

	fn leftover_temp_files(path: &Path) -> Vec<PathBuf> {
		let prefix = format!(
			"{}.",
			path.file_name().and_then(|name| name.to_str()).expect("Temp path should be UTF-8.")
		);
		let parent = path.parent().expect("Temp path should have a parent.");

		fs::read_dir(parent)
			.expect("Temp directory should be listable.")
			.filter_map(|entry| entry.ok().map(|entry| entry.path()))
			.filter(|p| {
				p.file_name()
					.and_then(|name| name.to_str())
					.is_some_and(|name| name.starts_with(&prefix) && name.ends_with(".tmp"))
			})
			.collect()
	}

	#[test]
	fn temp_path_is_a_sibling() {
		let path = Path::new("/var/cache/practice/token.json");
		let tmp = FileTokenCache::temp_path(path);
		let name = tmp.file_name().and_then(|name| name.to_str()).expect("Temp name should be UTF-8.");

		assert_eq!(tmp.parent(), path.parent());
		assert!(name.starts_with(&format!("token.json.{}.", process::id())));
		assert!(name.ends_with(".tmp"));
	}

	#[test]
	fn temp_paths_differ_per_write() {
		let path = Path::new("/var/cache/practice/token.json");

		assert_ne!(FileTokenCache::temp_path(path), FileTokenCache::temp_path(path));
	}

	#[test]
	fn atomic_write_leaves_no_temp_file() {
		let path = temp_cache_path("atomic");
		let cache = FileTokenCache::new(&path);

		cache
			.set("abc123", OffsetDateTime::now_utc() + Duration::hours(1))
			.expect("Atomic write should succeed.");

		assert!(path.exists());
		assert!(leftover_temp_files(&path).is_empty());

		remove_cache_file(&path);
	}

	#[test]
	fn trailing_garbage_is_a_serialization_error() {
		let path = temp_cache_path("trailing");

		fs::write(&path, br#"{"token":"abc123","expiresAt":"2999-01-01T00:00:00Z"} junk"#)
			.expect("Fixture file should be writable.");

		let err = FileTokenCache::new(&path).get().expect_err("Trailing bytes should be rejected.");

		assert!(matches!(err, CacheError::Serialization { .. }));

		remove_cache_file(&path);
	}

	#[test]
	fn unmarshal_errors_name_the_failing_field() {
		let path = temp_cache_path("field");

		fs::write(&path, br#"{"token":"abc123","expiresAt":"yesterday"}"#)
			.expect("Fixture file should be writable.");

		let err = FileTokenCache::new(&path).get().expect_err("Bad timestamps should be rejected.");
		let CacheError::Serialization { message } = err else {
			panic!("Expected a serialization error, got {err:?}.");
		};

		assert!(message.starts_with("Failed to unmarshal token record"));
		assert!(message.contains("expiresAt"));

		remove_cache_file(&path);
	}
}
