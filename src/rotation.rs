use std::time::Duration;

use serde::{Deserialize, Deserializer, de};

use crate::{Error, Result};

/// Parse a size string with an optional unit (K/M/G, case-insensitive).
///
/// A bare number is a byte count.
fn parse_size(s: &str) -> std::result::Result<u64, String> {
    let s = s.trim();
    let Some(last) = s.chars().last() else {
        return Err("empty size string".to_string());
    };

    let (num_str, multiplier) = if last.is_alphabetic() {
        let multiplier = match last.to_ascii_uppercase() {
            'K' => 1024,
            'M' => 1024 * 1024,
            'G' => 1024 * 1024 * 1024,
            unit => return Err(format!("invalid unit: {}, supported: K/M/G", unit)),
        };
        (&s[..s.len() - last.len_utf8()], multiplier)
    } else {
        (s, 1)
    };

    let num: u64 = num_str
        .trim()
        .parse()
        .map_err(|_| format!("invalid number: {}", num_str))?;

    num.checked_mul(multiplier)
        .ok_or_else(|| "size too large".to_string())
}

/// Size value that can be a number or string with units.
#[derive(Deserialize)]
#[serde(untagged)]
enum SizeValue {
    Number(u64),
    String(String),
}

impl SizeValue {
    fn to_bytes(&self) -> std::result::Result<u64, String> {
        match self {
            SizeValue::Number(n) => Ok(*n),
            SizeValue::String(s) => parse_size(s),
        }
    }
}

pub(crate) fn deserialize_size<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    SizeValue::deserialize(deserializer)?
        .to_bytes()
        .map_err(de::Error::custom)
}

pub(crate) fn deserialize_buffer_size<'de, D>(deserializer: D) -> std::result::Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    let bytes = deserialize_size(deserializer)?;
    usize::try_from(bytes).map_err(|_| de::Error::custom("buffer size too large"))
}

/// Convert a rotation interval such as `30m`, `12h`, `1d` or `2w` into a duration.
///
/// `d` and `w` are expanded into hours before parsing; `s`, `m` and `h` go to
/// the duration parser untouched.
pub fn parse_rotate_interval(interval: &str) -> Result<Duration> {
    let Some(unit) = interval.chars().last() else {
        return Err(Error::Interval(interval.to_string()));
    };
    if interval.len() < 2 {
        return Err(Error::Interval(interval.to_string()));
    }

    let duration = match unit.to_ascii_lowercase() {
        unit @ ('w' | 'd') => {
            let prefix = &interval[..interval.len() - 1];
            let count: u64 = prefix
                .parse()
                .map_err(|_| Error::Interval(format!("{}: invalid number {}", interval, prefix)))?;
            let hours = if unit == 'w' { 7 * 24 } else { 24 };
            count
                .checked_mul(hours * 3600)
                .map(Duration::from_secs)
                .ok_or_else(|| Error::Interval(format!("{}: too large", interval)))?
        }
        'h' | 'm' | 's' => humantime::parse_duration(interval)
            .map_err(|e| Error::Interval(format!("{}: {}", interval, e)))?,
        other => {
            return Err(Error::Interval(format!(
                "unsupported rotate interval type: {}",
                other
            )));
        }
    };

    if duration.is_zero() {
        return Err(Error::Interval(format!("{}: must be positive", interval)));
    }

    Ok(duration)
}

/// What makes the active log file roll over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationTrigger {
    /// Rotate once the file would grow beyond `max_size` bytes.
    Size {
        /// Maximum file size in bytes before rotation.
        max_size: u64,
    },
    /// Rotate at every multiple of `interval` since the Unix epoch.
    Time {
        /// Length of one rotation period.
        interval: Duration,
    },
}

impl RotationTrigger {
    /// Create a size-based rotation trigger.
    pub fn size(max_size: u64) -> Self {
        Self::Size { max_size }
    }

    /// Create a time-based rotation trigger.
    pub fn time(interval: Duration) -> Self {
        Self::Time { interval }
    }

    /// Check if this trigger is size-based.
    pub fn has_size_rotation(&self) -> bool {
        matches!(self, Self::Size { .. })
    }
}

/// Everything a [`RotatingWriter`](crate::RotatingWriter) needs besides its path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationPolicy {
    /// Rotation trigger.
    pub trigger: RotationTrigger,
    /// Number of rotated files to keep. Zero keeps none.
    pub max_backups: usize,
    /// Gzip rotated files.
    pub compress: bool,
    /// Write buffer capacity in bytes. Zero writes through immediately.
    pub buffer_size: usize,
    /// Unix permission bits for newly created log files.
    pub file_perm: u32,
}

impl RotationPolicy {
    /// Create a policy with 12 backups, compression on, no buffering and mode 0700.
    pub fn new(trigger: RotationTrigger) -> Self {
        Self {
            trigger,
            max_backups: 12,
            compress: true,
            buffer_size: 0,
            file_perm: 0o700,
        }
    }

    pub fn with_max_backups(mut self, max_backups: usize) -> Self {
        self.max_backups = max_backups;
        self
    }

    pub fn with_compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    pub fn with_file_perm(mut self, file_perm: u32) -> Self {
        self.file_perm = file_perm;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: u64 = 3600;

    #[test]
    fn test_rotate_interval_weeks_and_days_become_hours() {
        assert_eq!(
            parse_rotate_interval("2w").unwrap(),
            Duration::from_secs(336 * HOUR)
        );
        assert_eq!(
            parse_rotate_interval("1d").unwrap(),
            Duration::from_secs(24 * HOUR)
        );
        assert_eq!(
            parse_rotate_interval("3D").unwrap(),
            Duration::from_secs(72 * HOUR)
        );
    }

    #[test]
    fn test_rotate_interval_passthrough_units() {
        assert_eq!(
            parse_rotate_interval("5m").unwrap(),
            Duration::from_secs(5 * 60)
        );
        assert_eq!(
            parse_rotate_interval("2h").unwrap(),
            Duration::from_secs(2 * HOUR)
        );
        assert_eq!(parse_rotate_interval("1s").unwrap(), Duration::from_secs(1));
    }

    #[test]
    fn test_rotate_interval_rejects_malformed() {
        for interval in ["", "x", "1", "1y", "xd", "0h", "0w"] {
            assert!(
                parse_rotate_interval(interval).is_err(),
                "{:?} should be rejected",
                interval
            );
        }
    }

    #[test]
    fn test_parse_size_units() {
        assert_eq!(parse_size("10").unwrap(), 10);
        assert_eq!(parse_size("5K").unwrap(), 5 * 1024);
        assert_eq!(parse_size("3k").unwrap(), 3 * 1024);
        assert_eq!(parse_size("2M").unwrap(), 2 * 1024 * 1024);
        assert_eq!(parse_size("4m").unwrap(), 4 * 1024 * 1024);
        assert_eq!(parse_size("1g").unwrap(), 1024 * 1024 * 1024);
        assert!(parse_size("").is_err());
        assert!(parse_size("10T").is_err());
        assert!(parse_size("abcM").is_err());
    }

    #[test]
    fn test_rotation_policy_defaults() {
        let policy = RotationPolicy::new(RotationTrigger::size(1024));
        assert_eq!(policy.max_backups, 12);
        assert!(policy.compress);
        assert_eq!(policy.buffer_size, 0);
        assert_eq!(policy.file_perm, 0o700);
        assert!(policy.trigger.has_size_rotation());

        let policy = RotationPolicy::new(RotationTrigger::time(Duration::from_secs(60)))
            .with_max_backups(2)
            .with_compress(false)
            .with_buffer_size(4096)
            .with_file_perm(0o644);
        assert_eq!(policy.max_backups, 2);
        assert!(!policy.compress);
        assert_eq!(policy.buffer_size, 4096);
        assert_eq!(policy.file_perm, 0o644);
        assert!(!policy.trigger.has_size_rotation());
    }
}
