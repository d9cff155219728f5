// Append-only log file with size based rotation.
// When a write would push the active file past the size limit, the file is
// renamed to `<stem>-<UTC timestamp>.<ext>` (gzipped when configured) and a
// fresh file takes its place. Old backups are pruned by count and age.

use super::sink::LogSink;
use crate::app::config::RotationConfig;
use chrono::{DateTime, NaiveDateTime, Utc};
use flate2::Compression;
use flate2::write::GzEncoder;
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

const BACKUP_TIME_FORMAT: &str = "%Y-%m-%dT%H-%M-%S%.3f";

struct Inner {
    file: File,
    size: u64,
}

pub struct RotatingFileWriter {
    path: PathBuf,
    config: RotationConfig,
    // Held only for the duration of one write (and its rotation).
    inner: Mutex<Inner>,
}

impl std::fmt::Debug for RotatingFileWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotatingFileWriter")
            .field("path", &self.path)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RotatingFileWriter {
    /// Open (or create) the log file, creating parent directories.
    pub fn open(path: impl Into<PathBuf>, config: RotationConfig) -> io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let file = open_append(&path)?;
        let size = file.metadata()?.len();

        Ok(Self {
            path,
            config,
            inner: Mutex::new(Inner { file, size }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &RotationConfig {
        &self.config
    }

    /// Append one line, rotating first if it would not fit.
    ///
    /// A line larger than the limit is still written, alone, to a fresh file.
    /// Once the fresh file is open the line is written before compression
    /// and pruning run, and their failures are reported on stderr.
    pub fn write(&self, line: &[u8]) -> io::Result<()> {
        let mut inner = self.inner.lock();
        let len = line.len() as u64;

        let rolled = if inner.size > 0 && inner.size + len > self.config.max_size_bytes() {
            Some(self.roll_over(&mut inner)?)
        } else {
            None
        };

        inner.file.write_all(line)?;
        inner.size += len;

        if let Some(backup) = rolled {
            self.housekeep(&backup);
        }
        Ok(())
    }

    pub fn flush(&self) -> io::Result<()> {
        self.inner.lock().file.flush()
    }

    /// Force a rotation regardless of size.
    pub fn rotate_now(&self) -> io::Result<()> {
        let mut inner = self.inner.lock();
        let backup = self.roll_over(&mut inner)?;
        self.housekeep(&backup);
        Ok(())
    }

    /// Move the active file aside and reopen a fresh one. Returns the backup.
    fn roll_over(&self, inner: &mut Inner) -> io::Result<PathBuf> {
        inner.file.flush()?;

        let backup = self.unused_backup_path(Utc::now());
        fs::rename(&self.path, &backup)?;

        inner.file = open_append(&self.path)?;
        inner.size = 0;
        Ok(backup)
    }

    fn housekeep(&self, backup: &Path) {
        if self.config.compress
            && let Err(e) = compress_backup(backup)
        {
            eprintln!("Warning: failed to compress {}: {e}", backup.display());
        }
        if let Err(e) = self.prune() {
            eprintln!(
                "Warning: failed to prune backups of {}: {e}",
                self.path.display()
            );
        }
    }

    fn stem_and_ext(&self) -> (String, String) {
        let stem = self
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "log".to_string());
        let ext = self
            .path
            .extension()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "log".to_string());
        (stem, ext)
    }

    fn directory(&self) -> PathBuf {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    pub fn backup_path(&self, at: DateTime<Utc>) -> PathBuf {
        let (stem, ext) = self.stem_and_ext();
        let name = format!("{stem}-{}.{ext}", at.format(BACKUP_TIME_FORMAT));
        self.directory().join(name)
    }

    fn unused_backup_path(&self, at: DateTime<Utc>) -> PathBuf {
        let candidate = self.backup_path(at);
        if !candidate.exists() && !gz_path(&candidate).exists() {
            return candidate;
        }
        let (stem, ext) = self.stem_and_ext();
        let stamp = at.format(BACKUP_TIME_FORMAT);
        (1u32..)
            .map(|n| self.directory().join(format!("{stem}-{stamp}-{n}.{ext}")))
            .find(|p| !p.exists() && !gz_path(p).exists())
            .unwrap_or(candidate)
    }

    /// Whether `name` is `<stem>-<stamp>[-N].<ext>[.gz]` for this writer.
    fn is_backup_name(&self, name: &str) -> bool {
        let (stem, ext) = self.stem_and_ext();
        let Some(rest) = name.strip_prefix(&stem).and_then(|r| r.strip_prefix('-')) else {
            return false;
        };
        let Some(stamp) = rest
            .strip_suffix(".gz")
            .unwrap_or(rest)
            .strip_suffix(&format!(".{ext}"))
        else {
            return false;
        };

        let parses = |s: &str| NaiveDateTime::parse_from_str(s, BACKUP_TIME_FORMAT).is_ok();
        if parses(stamp) {
            return true;
        }
        stamp.rsplit_once('-').is_some_and(|(head, n)| {
            !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()) && parses(head)
        })
    }

    /// Rotated files belonging to this writer, oldest first.
    pub fn backups(&self) -> io::Result<Vec<PathBuf>> {
        let mut backups: Vec<PathBuf> = fs::read_dir(self.directory())?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|name| self.is_backup_name(name))
            })
            .filter(|path| path != &self.path)
            .collect();

        // Same-millisecond rotations get a `-N` suffix, so the name alone
        // does not order them.
        backups.sort_by_cached_key(|path| {
            let modified = fs::metadata(path)
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            let name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
            (modified, name.len(), name)
        });
        Ok(backups)
    }

    /// Remove backups older than `max_age_days`, then the oldest beyond
    /// `max_backups`. A backup that cannot be removed is reported and skipped.
    fn prune(&self) -> io::Result<()> {
        let mut backups = self.backups()?;

        if let Some(max_age) = self.config.max_age() {
            let cutoff = SystemTime::now()
                .checked_sub(max_age)
                .unwrap_or(SystemTime::UNIX_EPOCH);
            backups.retain(|path| {
                let expired = fs::metadata(path)
                    .and_then(|m| m.modified())
                    .is_ok_and(|modified| modified < cutoff);
                if expired {
                    remove_backup(path);
                }
                !expired
            });
        }

        let max_backups = self.config.max_backups;
        if max_backups > 0 && backups.len() > max_backups {
            let excess = backups.len() - max_backups;
            for path in backups.iter().take(excess) {
                remove_backup(path);
            }
        }

        Ok(())
    }
}

impl LogSink for RotatingFileWriter {
    fn name(&self) -> &'static str {
        "file"
    }

    fn write_line(&mut self, line: &[u8]) -> io::Result<()> {
        RotatingFileWriter::write(self, line)
    }

    fn flush(&mut self) -> io::Result<()> {
        RotatingFileWriter::flush(self)
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

fn remove_backup(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        eprintln!("Warning: failed to remove backup {}: {e}", path.display());
    }
}

fn gz_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".gz");
    PathBuf::from(name)
}

fn compress_backup(path: &Path) -> io::Result<()> {
    let data = fs::read(path)?;
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&data)?;
    let compressed = encoder.finish()?;

    fs::write(gz_path(path), compressed)?;
    fs::remove_file(path)
}
