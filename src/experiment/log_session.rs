//! Scoped log capture: a tee writer over the console and a session file
//!
//! A [`LogSession`] duplicates everything written to it into an inner echo
//! sink (stdout by default) and a per-session file under the experiment's
//! logs directory. Each session file is named by its opening timestamp and
//! starts with a timestamp header. Dropping the session flushes and closes
//! the file on every exit path.
//!
//! This is an explicit writer, not a process-wide stdout redirection, so
//! there is no global state to restore and sessions cannot corrupt each
//! other's teardown.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::error::Result;

/// An open log-capture session.
pub struct LogSession {
    file: File,
    echo: Box<dyn Write + Send>,
    path: PathBuf,
}

impl LogSession {
    pub(crate) fn open(logs_dir: &Path, echo: Box<dyn Write + Send>) -> Result<Self> {
        fs::create_dir_all(logs_dir)?;

        let now = Local::now();
        // Sub-second precision so sessions opened back to back get distinct files
        let path = logs_dir.join(now.format("%Y-%m-%d-%H-%M-%S%.9f").to_string());
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;

        writeln!(file, "\n{}\n", now.format("%Y-%m-%d %H:%M:%S"))?;

        Ok(Self { file, echo, path })
    }

    /// Path of this session's log file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Write for LogSession {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.file.write_all(buf)?;
        self.echo.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.file.flush()?;
        self.echo.flush()
    }
}

impl Drop for LogSession {
    fn drop(&mut self) {
        let _ = self.file.flush();
        let _ = self.echo.flush();
    }
}

impl std::fmt::Debug for LogSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogSession")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}
