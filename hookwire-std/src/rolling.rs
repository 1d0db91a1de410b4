//! Size-rotated log file.
//!
//! [`RollingFile`] appends to `dir/name`. Once a record would push the file
//! past `rotate_size`, the file is shifted to `name.1` (older backups move to
//! `name.2`, `name.3`, ...) and a fresh file is opened. At most `max_files`
//! backups are kept.
//!
//! Rotation is checked once per `write_all`, which the render sink calls
//! exactly once per record, so a record is never split across two files.

use std::{
    fs::{self, File, OpenOptions},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

/// Buffering and rotation limits of a [`RollingFile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollingConfig {
    /// Bytes buffered in memory before reaching the file.
    pub buffer_size: usize,
    /// Size that triggers rotation; `0` disables rotation.
    pub rotate_size: u64,
    /// Backups kept; `0` truncates instead of keeping any.
    pub max_files: usize,
}

impl Default for RollingConfig {
    fn default() -> Self {
        Self {
            buffer_size: 32 * 1024,
            rotate_size: 256 * 1024 * 1024,
            max_files: 10,
        }
    }
}

/// An appending, size-rotated file writer.
#[derive(Debug)]
pub struct RollingFile {
    dir: PathBuf,
    name: String,
    config: RollingConfig,
    writer: Option<BufWriter<File>>,
    written: u64,
}

impl RollingFile {
    /// Open (or create) `dir/name` for appending. Creates `dir` if missing.
    pub fn open(dir: impl AsRef<Path>, name: impl Into<String>, config: RollingConfig) -> io::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        let name = name.into();
        if name.is_empty() {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "empty log file name"));
        }
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(&dir)?;
        }

        let mut file = Self {
            dir,
            name,
            config,
            writer: None,
            written: 0,
        };
        file.reopen()?;
        Ok(file)
    }

    /// Path of the active file.
    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.name)
    }

    /// Path of backup number `n` (1 is the newest).
    pub fn backup_path(&self, n: usize) -> PathBuf {
        self.dir.join(format!("{}.{n}", self.name))
    }

    /// Bytes in the active file, including what is still buffered.
    pub fn written(&self) -> u64 {
        self.written
    }

    fn reopen(&mut self) -> io::Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path())?;
        self.written = file.metadata()?.len();
        self.writer = Some(BufWriter::with_capacity(self.config.buffer_size.max(1), file));
        Ok(())
    }

    fn needs_rotation(&self, incoming: usize) -> bool {
        self.config.rotate_size > 0
            && self.written > 0
            && self.written + incoming as u64 > self.config.rotate_size
    }

    /// Close the active file, shift backups, and open a fresh file.
    pub fn rotate(&mut self) -> io::Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }

        let max = self.config.max_files;
        if max == 0 {
            File::create(self.path())?;
        } else {
            let oldest = self.backup_path(max);
            if oldest.exists() {
                fs::remove_file(&oldest)?;
            }
            for n in (1..max).rev() {
                let from = self.backup_path(n);
                if from.exists() {
                    fs::rename(&from, self.backup_path(n + 1))?;
                }
            }
            fs::rename(self.path(), self.backup_path(1))?;
        }

        tracing::debug!(path = %self.path().display(), "rotated log file");
        self.reopen()
    }

    fn writer(&mut self) -> io::Result<&mut BufWriter<File>> {
        if self.writer.is_none() {
            self.reopen()?;
        }
        self.writer
            .as_mut()
            .ok_or_else(|| io::Error::other("log file is not open"))
    }
}

impl Write for RollingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.writer()?.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        if self.needs_rotation(buf.len()) {
            self.rotate()?;
        }
        self.writer()?.write_all(buf)?;
        self.written += buf.len() as u64;
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.writer.as_mut() {
            Some(writer) => writer.flush(),
            None => Ok(()),
        }
    }
}
