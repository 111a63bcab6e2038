//! Append-only log file that can be closed while loggers still hold it.
//!
//! Every write takes the sink's lock, so `close()` never races an in-flight
//! write. Writes that arrive after `close()` are dropped.

use crate::error::LoggerError;
use parking_lot::{Mutex, MutexGuard};
use std::fs::{DirBuilder, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::fmt::MakeWriter;

#[cfg(unix)]
use std::os::unix::fs::{DirBuilderExt, OpenOptionsExt};

#[cfg(unix)]
const DIR_MODE: u32 = 0o755;
#[cfg(unix)]
const FILE_MODE: u32 = 0o666;

#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
    file: Arc<Mutex<Option<File>>>,
}

impl FileSink {
    /// Creates missing parent directories, then opens `path` for append,
    /// creating it if absent.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LoggerError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            create_log_dir(parent).map_err(|source| LoggerError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let file = open_append(&path).map_err(|source| LoggerError::OpenFile {
            path: path.clone(),
            source,
        })?;

        Ok(Self {
            path,
            file: Arc::new(Mutex::new(Some(file))),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_closed(&self) -> bool {
        self.file.lock().is_none()
    }

    /// Flushes and releases the file handle. Closing an already closed sink
    /// is a no-op.
    pub fn close(&self) -> Result<(), LoggerError> {
        let Some(mut file) = self.file.lock().take() else {
            return Ok(());
        };

        file.flush()
            .and_then(|()| file.sync_all())
            .map_err(|source| LoggerError::Close {
                path: self.path.clone(),
                source,
            })
    }
}

fn create_log_dir(dir: &Path) -> io::Result<()> {
    let mut builder = DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(DIR_MODE);
    builder.create(dir)
}

fn open_append(path: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.create(true).append(true);
    #[cfg(unix)]
    options.mode(FILE_MODE);
    options.open(path)
}

pub struct FileSinkWriter<'a> {
    guard: MutexGuard<'a, Option<File>>,
}

impl Write for FileSinkWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.guard.as_mut() {
            Some(file) => file.write(buf),
            None => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.guard.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

impl<'a> MakeWriter<'a> for FileSink {
    type Writer = FileSinkWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        FileSinkWriter {
            guard: self.file.lock(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_open_creates_missing_directories() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("a").join("b").join("app.log");

        let sink = FileSink::open(&path).unwrap();

        assert!(path.parent().unwrap().is_dir());
        assert!(path.is_file());
        assert_eq!(sink.path(), path.as_path());
        assert!(!sink.is_closed());
    }

    #[test]
    fn test_open_appends_to_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("app.log");
        fs::write(&path, "existing\n").unwrap();

        let sink = FileSink::open(&path).unwrap();
        sink.make_writer().write_all(b"appended\n").unwrap();
        sink.close().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "existing\nappended\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_directory_mode() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("logs");
        let _sink = FileSink::open(dir.join("app.log")).unwrap();

        let mode = fs::metadata(&dir).unwrap().permissions().mode() & 0o777;
        // umask can only remove bits
        assert_eq!(mode & !DIR_MODE, 0);
        assert_ne!(mode & 0o700, 0);
    }

    #[test]
    fn test_open_fails_when_parent_is_a_file() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();

        let err = FileSink::open(blocker.join("app.log")).unwrap_err();
        assert!(err.is_file_error());
    }

    #[test]
    fn test_open_fails_when_path_is_a_directory() {
        let temp_dir = TempDir::new().unwrap();

        let err = FileSink::open(temp_dir.path()).unwrap_err();
        assert!(matches!(err, LoggerError::OpenFile { .. }));
    }

    #[test]
    fn test_close_is_idempotent_and_drops_later_writes() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("app.log");
        let sink = FileSink::open(&path).unwrap();

        sink.make_writer().write_all(b"before\n").unwrap();
        sink.close().unwrap();
        assert!(sink.is_closed());
        sink.close().unwrap();

        sink.make_writer().write_all(b"after\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "before\n");
    }

    #[test]
    fn test_clones_share_the_handle() {
        let temp_dir = TempDir::new().unwrap();
        let sink = FileSink::open(temp_dir.path().join("app.log")).unwrap();
        let clone = sink.clone();

        sink.close().unwrap();
        assert!(clone.is_closed());
    }
}
