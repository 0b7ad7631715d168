use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::{RotationPolicy, RotationTrigger};

/// State of the current log file.
#[derive(Debug)]
struct FileState {
    /// The open file, buffered according to the policy.
    file: BufWriter<File>,
    /// Current size of the file in bytes.
    size: u64,
    /// Unix second at which a time-rotated file rolls over.
    rotate_at: Option<u64>,
}

/// A writer that rotates log files based on size or time.
///
/// The active file always lives at the base path. Size rotation keeps numbered
/// backups (`app.log.1` is the newest); time rotation keeps backups stamped
/// with the start of their period (`app.log.20260105_000000`).
#[derive(Debug)]
pub struct RotatingWriter {
    /// Path of the active log file.
    base_path: PathBuf,
    /// Rotation settings.
    policy: RotationPolicy,
    /// Current file state, protected by mutex.
    state: Mutex<Option<FileState>>,
}

impl RotatingWriter {
    /// Create a new rotating writer, creating missing parent directories.
    pub fn new(base_path: &Path, policy: RotationPolicy) -> io::Result<Self> {
        let writer = Self {
            base_path: base_path.to_path_buf(),
            policy,
            state: Mutex::new(None),
        };

        if let Some(parent) = writer.base_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let initial = writer.open_state(unix_now())?;
        *writer.lock() = Some(initial);

        Ok(writer)
    }

    /// Path of the active log file.
    pub fn path(&self) -> &Path {
        &self.base_path
    }

    pub fn policy(&self) -> &RotationPolicy {
        &self.policy
    }

    /// Write a buffer, rotating first if the policy asks for it.
    pub fn write_bytes(&self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self.lock();
        let now = unix_now();

        let needs_rotation = match guard.as_ref() {
            None => true,
            Some(state) => self.needs_rotation(state, buf.len(), now),
        };
        if needs_rotation {
            self.rotate(&mut guard, now)?;
        }

        let state = guard
            .as_mut()
            .ok_or_else(|| io::Error::other("Failed to open log file"))?;
        let written = state.file.write(buf)?;
        state.size += written as u64;
        Ok(written)
    }

    /// Flush buffered bytes to the active file.
    pub fn flush_file(&self) -> io::Result<()> {
        match self.lock().as_mut() {
            Some(state) => state.file.flush(),
            None => Ok(()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<FileState>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn open_file(&self) -> io::Result<File> {
        let mut options = OpenOptions::new();
        options.create(true).append(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(self.policy.file_perm);
        }
        options.open(&self.base_path)
    }

    fn open_state(&self, now: u64) -> io::Result<FileState> {
        let file = self.open_file()?;
        let size = file.metadata().map(|m| m.len()).unwrap_or(0);

        Ok(FileState {
            file: BufWriter::with_capacity(self.policy.buffer_size, file),
            size,
            rotate_at: self.next_rotation(now),
        })
    }

    /// End of the time period containing `now`.
    fn next_rotation(&self, now: u64) -> Option<u64> {
        match self.policy.trigger {
            RotationTrigger::Size { .. } => None,
            RotationTrigger::Time { interval } => {
                let period = interval.as_secs().max(1);
                Some((now / period + 1) * period)
            }
        }
    }

    fn period_secs(&self) -> u64 {
        match self.policy.trigger {
            RotationTrigger::Size { .. } => 0,
            RotationTrigger::Time { interval } => interval.as_secs().max(1),
        }
    }

    fn needs_rotation(&self, state: &FileState, buf_len: usize, now: u64) -> bool {
        match self.policy.trigger {
            RotationTrigger::Size { max_size } => {
                state.size > 0 && state.size + buf_len as u64 > max_size
            }
            RotationTrigger::Time { .. } => state.rotate_at.is_some_and(|at| now >= at),
        }
    }

    /// Close the active file, turn it into a backup and open a fresh one.
    fn rotate(&self, slot: &mut Option<FileState>, now: u64) -> io::Result<()> {
        if let Some(mut previous) = slot.take() {
            previous.file.flush()?;
            let had_content = previous.size > 0;
            let period_start = previous
                .rotate_at
                .map(|at| at.saturating_sub(self.period_secs()));
            drop(previous);

            if had_content && self.base_path.exists() {
                if self.policy.max_backups == 0 {
                    fs::remove_file(&self.base_path)?;
                } else {
                    match period_start {
                        Some(start) => self.rotate_by_time(start)?,
                        None => self.rotate_by_size()?,
                    }
                }
            }
        }

        *slot = Some(self.open_state(now)?);
        Ok(())
    }

    fn numbered_path(&self, index: usize, compressed: bool) -> PathBuf {
        let ext = if compressed { ".gz" } else { "" };
        PathBuf::from(format!("{}.{}{}", self.base_path.display(), index, ext))
    }

    /// Shift `base.N` -> `base.N+1` (dropping the oldest), then move the active
    /// file to `base.1`.
    fn rotate_by_size(&self) -> io::Result<()> {
        let max_backups = self.policy.max_backups;

        for compressed in [false, true] {
            let oldest = self.numbered_path(max_backups, compressed);
            if oldest.exists() {
                fs::remove_file(&oldest)?;
            }
        }

        for i in (1..max_backups).rev() {
            for compressed in [false, true] {
                let from = self.numbered_path(i, compressed);
                if from.exists() {
                    fs::rename(&from, self.numbered_path(i + 1, compressed))?;
                }
            }
        }

        let first = self.numbered_path(1, false);
        fs::rename(&self.base_path, &first)?;
        self.finish_backup(&first)
    }

    /// Move the active file to a backup stamped with its period start and
    /// prune old stamped backups.
    fn rotate_by_time(&self, period_start: u64) -> io::Result<()> {
        let stamp = backup_stamp(period_start)?;
        let mut target = PathBuf::from(format!("{}.{}", self.base_path.display(), stamp));
        let mut attempt = 1;
        while target.exists() || PathBuf::from(format!("{}.gz", target.display())).exists() {
            target = PathBuf::from(format!("{}.{}_{}", self.base_path.display(), stamp, attempt));
            attempt += 1;
        }

        fs::rename(&self.base_path, &target)?;
        self.finish_backup(&target)?;
        self.prune_stamped_backups()
    }

    fn finish_backup(&self, backup: &Path) -> io::Result<()> {
        if self.policy.compress {
            compress_file(backup)?;
        }
        Ok(())
    }

    fn prune_stamped_backups(&self) -> io::Result<()> {
        let dir = match self.base_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let Some(file_name) = self.base_path.file_name().and_then(|n| n.to_str()) else {
            return Ok(());
        };
        let prefix = format!("{}.", file_name);

        let mut backups: Vec<(String, PathBuf)> = fs::read_dir(&dir)?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name().into_string().ok()?;
                let rest = name.strip_prefix(&prefix)?;
                rest.starts_with(|c: char| c.is_ascii_digit())
                    .then(|| (name.clone(), entry.path()))
            })
            .collect();

        if backups.len() <= self.policy.max_backups {
            return Ok(());
        }

        backups.sort();
        let excess = backups.len() - self.policy.max_backups;
        for (_, path) in backups.into_iter().take(excess) {
            fs::remove_file(path)?;
        }

        Ok(())
    }
}

impl Write for &RotatingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_bytes(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flush_file()
    }
}

impl Write for RotatingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_bytes(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flush_file()
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn backup_stamp(unix_secs: u64) -> io::Result<String> {
    let at = time::OffsetDateTime::from_unix_timestamp(unix_secs as i64)
        .map_err(io::Error::other)?;
    let format =
        time::format_description::parse("[year][month][day]_[hour][minute][second]")
            .map_err(io::Error::other)?;
    at.format(&format).map_err(io::Error::other)
}

/// Gzip `path` into `path.gz` and remove the original.
#[cfg(feature = "compress")]
fn compress_file(path: &Path) -> io::Result<PathBuf> {
    use flate2::Compression;
    use flate2::write::GzEncoder;

    let gz_path = PathBuf::from(format!("{}.gz", path.display()));
    let mut input = File::open(path)?;
    let output = File::create(&gz_path)?;
    let mut encoder = GzEncoder::new(output, Compression::default());
    io::copy(&mut input, &mut encoder)?;
    encoder.finish()?;
    fs::remove_file(path)?;
    Ok(gz_path)
}

/// Without the `compress` feature backups stay uncompressed.
#[cfg(not(feature = "compress"))]
fn compress_file(path: &Path) -> io::Result<PathBuf> {
    Ok(path.to_path_buf())
}
