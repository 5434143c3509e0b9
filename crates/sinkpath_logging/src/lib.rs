//! Tracing setup for sinkpath binaries.

use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_LOG_FILTER: &str = "sinkpath=info,sinkpath_step=info,sinkpath_cluster=info";
const MAX_LOG_FILES: usize = 5;
const MAX_LOG_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Logging configuration for a sinkpath binary.
pub struct LogConfig<'a> {
    pub app_name: &'a str,
    /// Mirror the file filter on stderr instead of warnings only.
    pub verbose: bool,
    /// Overrides `~/.sinkpath/logs`.
    pub log_dir: Option<PathBuf>,
}

/// Initialize tracing with a rolling file writer and stderr output.
pub fn init_logging(config: LogConfig<'_>) -> Result<()> {
    let log_dir = match config.log_dir {
        Some(dir) => dir,
        None => sinkpath_protocol::paths::default_logs_dir(),
    };
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create logs directory: {}", log_dir.display()))?;

    let file_writer = SharedRollingWriter::open(&log_dir, config.app_name)?;

    let file_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let console_filter = if config.verbose {
        file_filter.clone()
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_filter(file_filter),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_filter(console_filter),
        )
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::debug!(log_dir = %log_dir.display(), app = config.app_name, "Logging initialized");
    Ok(())
}

/// Size-capped log file that shifts `name.log` -> `name.log.1` -> ... on overflow.
struct RollingFile {
    dir: PathBuf,
    base_name: String,
    file: Option<File>,
    written: u64,
}

impl RollingFile {
    fn open(dir: &Path, app_name: &str) -> io::Result<Self> {
        let mut rolling = Self {
            dir: dir.to_path_buf(),
            base_name: sanitize_name(app_name),
            file: None,
            written: 0,
        };
        rolling.reopen()?;
        if rolling.written > MAX_LOG_FILE_SIZE {
            rolling.rotate()?;
        }
        Ok(rolling)
    }

    fn path(&self, generation: usize) -> PathBuf {
        match generation {
            0 => self.dir.join(format!("{}.log", self.base_name)),
            n => self.dir.join(format!("{}.log.{}", self.base_name, n)),
        }
    }

    fn reopen(&mut self) -> io::Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path(0))?;
        self.written = file.metadata()?.len();
        self.file = Some(file);
        Ok(())
    }

    fn rotate(&mut self) -> io::Result<()> {
        if let Some(mut file) = self.file.take() {
            let _ = file.flush();
        }
        let oldest = self.path(MAX_LOG_FILES - 1);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }
        for generation in (0..MAX_LOG_FILES - 1).rev() {
            let src = self.path(generation);
            if src.exists() {
                fs::rename(&src, self.path(generation + 1))?;
            }
        }
        self.reopen()
    }
}

impl Write for RollingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.written + buf.len() as u64 > MAX_LOG_FILE_SIZE {
            self.rotate()?;
        }
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "log file unavailable"))?;
        let n = file.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

#[derive(Clone)]
struct SharedRollingWriter {
    inner: Arc<Mutex<RollingFile>>,
}

impl SharedRollingWriter {
    fn open(dir: &Path, app_name: &str) -> Result<Self> {
        let file = RollingFile::open(dir, app_name)
            .with_context(|| format!("Failed to open log file for {}", app_name))?;
        Ok(Self {
            inner: Arc::new(Mutex::new(file)),
        })
    }

    fn with_file<T>(&self, f: impl FnOnce(&mut RollingFile) -> io::Result<T>) -> io::Result<T> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log writer lock poisoned"))?;
        f(&mut guard)
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for SharedRollingWriter {
    type Writer = SharedRollingWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

impl Write for SharedRollingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.with_file(|file| file.write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.with_file(|file| file.flush())
    }
}

fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                ch
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_replaces_path_separators() {
        assert_eq!(sanitize_name("sink/path cli"), "sink_path_cli");
    }

    #[test]
    fn rotation_shifts_generations() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = RollingFile::open(dir.path(), "app").unwrap();
        file.write_all(b"first\n").unwrap();
        file.rotate().unwrap();
        file.write_all(b"second\n").unwrap();
        file.flush().unwrap();

        let current = fs::read_to_string(dir.path().join("app.log")).unwrap();
        let previous = fs::read_to_string(dir.path().join("app.log.1")).unwrap();
        assert_eq!(current, "second\n");
        assert_eq!(previous, "first\n");
    }
}
