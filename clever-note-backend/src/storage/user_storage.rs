//! Human-readable per-user file storage
//!
//! Every user gets a directory under `<base>/users/`. Tools keep their data in
//! JSON Lines logs (one object per line, append-only) or in single-value text
//! files inside that directory. Logs have no in-place update, so edits and
//! deletes rewrite the whole file through a temp file + rename; a reader never
//! observes a half-written log.

use dashmap::DashMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Default threshold above which a storage operation is logged as slow
pub const DEFAULT_SLOW_OP_THRESHOLD: Duration = Duration::from_millis(200);

/// Disambiguates temp files created within the same process
static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Storage failure; never swallowed, always surfaced to the caller
#[derive(Debug)]
pub enum StorageError {
    /// Filesystem error on the given path
    Io { path: PathBuf, source: io::Error },
    /// A line of a JSONL log could not be encoded or decoded
    Serialization {
        path: PathBuf,
        line: usize,
        source: serde_json::Error,
    },
}

impl StorageError {
    fn io(path: &Path, source: io::Error) -> Self {
        StorageError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn serialization(path: &Path, line: usize, source: serde_json::Error) -> Self {
        StorageError::Serialization {
            path: path.to_path_buf(),
            line,
            source,
        }
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Io { path, source } => {
                write!(f, "I/O error on {}: {}", path.display(), source)
            }
            StorageError::Serialization { path, line, source } => {
                write!(f, "Bad JSON at {}:{}: {}", path.display(), line, source)
            }
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::Io { source, .. } => Some(source),
            StorageError::Serialization { source, .. } => Some(source),
        }
    }
}

/// Display info used to name a user's folder
#[derive(Debug, Clone, Default)]
struct UserInfo {
    username: Option<String>,
    first_name: Option<String>,
}

/// Per-user storage rooted at a data directory
pub struct UserStorage {
    base: PathBuf,
    user_info: DashMap<u64, UserInfo>,
    slow_threshold: Duration,
}

impl UserStorage {
    /// Open (and create if needed) storage at `base`
    pub fn open(base: impl AsRef<Path>) -> Result<Self, StorageError> {
        let base = base.as_ref().to_path_buf();
        let users = base.join("users");
        fs::create_dir_all(&users).map_err(|e| StorageError::io(&users, e))?;
        log::debug!("[STORAGE] Opened user storage at {}", base.display());
        Ok(Self {
            base,
            user_info: DashMap::new(),
            slow_threshold: DEFAULT_SLOW_OP_THRESHOLD,
        })
    }

    pub fn with_slow_threshold(mut self, threshold: Duration) -> Self {
        self.slow_threshold = threshold;
        self
    }

    /// Remember username / first name so the user's folder is human-readable.
    ///
    /// Folder is `<username>_<id>`, else `<first_name>_<id>`, else `<id>`.
    pub fn set_user_info(&self, user_id: u64, username: Option<&str>, first_name: Option<&str>) {
        let clean = |s: Option<&str>| s.map(sanitize_component).filter(|s| !s.is_empty());
        self.user_info.insert(
            user_id,
            UserInfo {
                username: clean(username),
                first_name: clean(first_name),
            },
        );
    }

    /// Directory for a user, created on first use
    pub fn user_dir(&self, user_id: u64) -> Result<PathBuf, StorageError> {
        let folder = match self.user_info.get(&user_id) {
            Some(info) => match (&info.username, &info.first_name) {
                (Some(username), _) => format!("{}_{}", username, user_id),
                (None, Some(first_name)) => format!("{}_{}", first_name, user_id),
                (None, None) => user_id.to_string(),
            },
            None => user_id.to_string(),
        };
        let dir = self.base.join("users").join(folder);
        fs::create_dir_all(&dir).map_err(|e| StorageError::io(&dir, e))?;
        Ok(dir)
    }

    fn file_path(&self, user_id: u64, rel: &str) -> Result<PathBuf, StorageError> {
        let path = self.user_dir(user_id)?.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
        }
        Ok(path)
    }

    /// Append items to a JSONL log
    pub fn append_jsonl<T: Serialize>(
        &self,
        user_id: u64,
        rel: &str,
        items: &[T],
    ) -> Result<(), StorageError> {
        let started = Instant::now();
        let path = self.file_path(user_id, rel)?;
        let payload = encode_lines(&path, items)?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| StorageError::io(&path, e))?;
        file.write_all(payload.as_bytes())
            .map_err(|e| StorageError::io(&path, e))?;

        log::debug!("append_jsonl({}) -> {} ({} items)", user_id, path.display(), items.len());
        self.log_if_slow("append_jsonl", started);
        Ok(())
    }

    /// Read every item of a JSONL log, oldest first; a missing log is empty
    pub fn read_jsonl<T: DeserializeOwned>(
        &self,
        user_id: u64,
        rel: &str,
    ) -> Result<Vec<T>, StorageError> {
        let started = Instant::now();
        let path = self.user_dir(user_id)?.join(rel);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::io(&path, e)),
        };

        let mut items = Vec::new();
        for (idx, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| StorageError::io(&path, e))?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let item = serde_json::from_str(line)
                .map_err(|e| StorageError::serialization(&path, idx + 1, e))?;
            items.push(item);
        }

        log::debug!("read_jsonl({}) <- {} ({} items)", user_id, path.display(), items.len());
        self.log_if_slow("read_jsonl", started);
        Ok(items)
    }

    /// Overwrite a JSONL log with exactly `items`
    pub fn replace_jsonl<T: Serialize>(
        &self,
        user_id: u64,
        rel: &str,
        items: &[T],
    ) -> Result<(), StorageError> {
        let started = Instant::now();
        let path = self.file_path(user_id, rel)?;
        let payload = encode_lines(&path, items)?;
        write_atomically(&path, payload.as_bytes())?;

        log::debug!("replace_jsonl({}) -> {} ({} items)", user_id, path.display(), items.len());
        self.log_if_slow("replace_jsonl", started);
        Ok(())
    }

    /// Read a single-value text file; a missing file reads as ""
    pub fn read_text(&self, user_id: u64, rel: &str) -> Result<String, StorageError> {
        let started = Instant::now();
        let path = self.user_dir(user_id)?.join(rel);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(StorageError::io(&path, e)),
        };
        log::debug!("read_text({}) <- {} ({} chars)", user_id, path.display(), content.len());
        self.log_if_slow("read_text", started);
        Ok(content)
    }

    /// Replace a single-value text file
    pub fn write_text(&self, user_id: u64, rel: &str, text: &str) -> Result<(), StorageError> {
        let started = Instant::now();
        let path = self.file_path(user_id, rel)?;
        write_atomically(&path, text.as_bytes())?;
        log::debug!("write_text({}) -> {} ({} chars)", user_id, path.display(), text.len());
        self.log_if_slow("write_text", started);
        Ok(())
    }

    fn log_if_slow(&self, op: &str, started: Instant) {
        let elapsed = started.elapsed();
        if elapsed >= self.slow_threshold {
            log::info!("slow_op: {} took {} ms", op, elapsed.as_millis());
        }
    }
}

fn encode_lines<T: Serialize>(path: &Path, items: &[T]) -> Result<String, StorageError> {
    let mut payload = String::new();
    for (idx, item) in items.iter().enumerate() {
        let line =
            serde_json::to_string(item).map_err(|e| StorageError::serialization(path, idx + 1, e))?;
        payload.push_str(&line);
        payload.push('\n');
    }
    Ok(payload)
}

/// Write `bytes` to a sibling temp file, fsync it, then rename it over `path`
fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(
        ".{}.{}.{}.tmp",
        file_name,
        std::process::id(),
        TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));

    let result = (|| {
        let mut file = File::create(&tmp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        fs::rename(&tmp, path)
    })();

    if let Err(e) = result {
        let _ = fs::remove_file(&tmp);
        return Err(StorageError::io(path, e));
    }
    Ok(())
}

/// Keep a display name safe to use as a path component
fn sanitize_component(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Item {
        n: u32,
    }

    fn storage() -> (TempDir, UserStorage) {
        let dir = TempDir::new().expect("temp dir");
        let storage = UserStorage::open(dir.path()).expect("open storage");
        (dir, storage)
    }

    #[test]
    fn test_missing_log_reads_empty() {
        let (_dir, storage) = storage();
        let items: Vec<Item> = storage.read_jsonl(1, "x/log.jsonl").unwrap();
        assert!(items.is_empty());
        assert_eq!(storage.read_text(1, "x/value.txt").unwrap(), "");
    }

    #[test]
    fn test_append_preserves_order() {
        let (_dir, storage) = storage();
        storage.append_jsonl(1, "x/log.jsonl", &[Item { n: 1 }]).unwrap();
        storage
            .append_jsonl(1, "x/log.jsonl", &[Item { n: 2 }, Item { n: 3 }])
            .unwrap();
        let items: Vec<Item> = storage.read_jsonl(1, "x/log.jsonl").unwrap();
        assert_eq!(items, vec![Item { n: 1 }, Item { n: 2 }, Item { n: 3 }]);
    }

    #[test]
    fn test_replace_leaves_no_temp_files() {
        let (_dir, storage) = storage();
        storage
            .append_jsonl(7, "x/log.jsonl", &[Item { n: 1 }, Item { n: 2 }])
            .unwrap();
        storage.replace_jsonl(7, "x/log.jsonl", &[Item { n: 9 }]).unwrap();

        let items: Vec<Item> = storage.read_jsonl(7, "x/log.jsonl").unwrap();
        assert_eq!(items, vec![Item { n: 9 }]);

        let dir = storage.user_dir(7).unwrap().join("x");
        let names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["log.jsonl".to_string()]);
    }

    #[test]
    fn test_users_are_isolated() {
        let (_dir, storage) = storage();
        storage.append_jsonl(1, "x/log.jsonl", &[Item { n: 1 }]).unwrap();
        let other: Vec<Item> = storage.read_jsonl(2, "x/log.jsonl").unwrap();
        assert!(other.is_empty());
    }

    #[test]
    fn test_malformed_line_is_an_error() {
        let (_dir, storage) = storage();
        let path = storage.user_dir(1).unwrap().join("log.jsonl");
        fs::write(&path, "{\"n\":1}\n\nnot json\n").unwrap();
        let result: Result<Vec<Item>, _> = storage.read_jsonl(1, "log.jsonl");
        match result {
            Err(StorageError::Serialization { line, .. }) => assert_eq!(line, 3),
            other => panic!("Expected serialization error, got {:?}", other),
        }
    }

    #[test]
    fn test_folder_naming() {
        let (dir, storage) = storage();
        assert_eq!(storage.user_dir(5).unwrap(), dir.path().join("users").join("5"));

        storage.set_user_info(5, None, Some("Ann Lee"));
        assert_eq!(
            storage.user_dir(5).unwrap(),
            dir.path().join("users").join("Ann_Lee_5")
        );

        storage.set_user_info(5, Some("ann"), Some("Ann Lee"));
        assert_eq!(storage.user_dir(5).unwrap(), dir.path().join("users").join("ann_5"));

        storage.set_user_info(6, Some("../evil"), None);
        assert_eq!(
            storage.user_dir(6).unwrap(),
            dir.path().join("users").join("___evil_6")
        );
    }

    #[test]
    fn test_write_text_overwrites() {
        let (_dir, storage) = storage();
        storage.write_text(1, "a/value.txt", "first").unwrap();
        storage.write_text(1, "a/value.txt", "second").unwrap();
        assert_eq!(storage.read_text(1, "a/value.txt").unwrap(), "second");
    }
}
