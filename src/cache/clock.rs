//! Clock Module
//!
//! Wall-clock timestamps in whole seconds and the expiry arithmetic shared by
//! the file-level and in-memory caches.

use std::io;
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::error::{CacheError, Result};

/// Unix timestamp in whole seconds.
pub type Timestamp = i64;

// == Now ==
/// Returns the current Unix timestamp in seconds.
pub fn now() -> Timestamp {
    Utc::now().timestamp()
}

// == Expired Before ==
/// Returns `now() - seconds`: anything last touched at or before this instant
/// is older than `seconds`.
///
/// # Errors
/// `InvalidArgument` if `seconds` is negative.
pub fn expired_before(seconds: i64) -> Result<Timestamp> {
    check_seconds(seconds)?;
    Ok(now() - seconds)
}

// == Expiry At ==
/// Returns `now() + seconds`, the absolute expiry for an entry stamped now.
///
/// # Errors
/// `InvalidArgument` if `seconds` is negative or the expiry overflows.
pub fn expiry_at(seconds: i64) -> Result<Timestamp> {
    check_seconds(seconds)?;
    now()
        .checked_add(seconds)
        .ok_or_else(|| out_of_range(seconds))
}

// == Is Expired ==
/// Checks an absolute expiry against the current time.
///
/// Boundary condition: an expiry equal to `now()` is already expired.
/// `None` means no expiry was recorded, which never expires.
pub fn is_expired(expiry: Option<Timestamp>) -> bool {
    match expiry {
        Some(expiry) => now() >= expiry,
        None => false,
    }
}

// == Modified At ==
/// Returns the file's last modification time in seconds, or `None` if there
/// is no regular file at `path`.
pub fn modified_at(path: &Path) -> io::Result<Option<Timestamp>> {
    match path.metadata() {
        Ok(meta) if meta.is_file() => {
            let modified: DateTime<Utc> = meta.modified()?.into();
            Ok(Some(modified.timestamp()))
        }
        Ok(_) => Ok(None),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

// == Check Seconds ==
/// Rejects negative durations with `InvalidArgument`.
fn check_seconds(seconds: i64) -> Result<()> {
    if seconds < 0 {
        return Err(CacheError::InvalidArgument(format!(
            "seconds must be >= 0, got {}",
            seconds
        )));
    }
    Ok(())
}

fn out_of_range(seconds: i64) -> CacheError {
    CacheError::InvalidArgument(format!(
        "seconds out of range for a timestamp, got {}",
        seconds
    ))
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_now_tracks_system_time() {
        let std_now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_secs() as i64;
        assert!((now() - std_now).abs() <= 1);
    }

    #[test]
    fn test_expiry_arithmetic() {
        let before = now();
        let expiry = expiry_at(60).unwrap();
        let cutoff = expired_before(60).unwrap();
        assert!(expiry >= before + 60 && expiry <= before + 61);
        assert!(cutoff >= before - 60 && cutoff <= before - 59);
    }

    #[test]
    fn test_zero_seconds_is_now() {
        let t = now();
        let expiry = expiry_at(0).unwrap();
        assert!(expiry - t <= 1);
    }

    #[test]
    fn test_negative_seconds_rejected() {
        assert!(matches!(expiry_at(-1), Err(CacheError::InvalidArgument(_))));
        assert!(matches!(
            expired_before(-5),
            Err(CacheError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_overflowing_seconds_rejected() {
        assert!(matches!(
            expiry_at(i64::MAX),
            Err(CacheError::InvalidArgument(_))
        ));
        assert!(expired_before(i64::MAX).is_ok());
        assert!(expiry_at(i64::MAX - now() - 1_000).is_ok());
    }

    #[test]
    fn test_is_expired_boundary() {
        assert!(is_expired(Some(now())));
        assert!(is_expired(Some(now() - 10)));
        assert!(!is_expired(Some(now() + 10)));
        assert!(!is_expired(None));
    }

    #[test]
    fn test_modified_at() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("data.txt");

        assert_eq!(modified_at(&file).unwrap(), None);
        assert_eq!(modified_at(dir.path()).unwrap(), None);

        std::fs::write(&file, "hello").unwrap();
        let mtime = modified_at(&file).unwrap().unwrap();
        assert!((mtime - now()).abs() <= 2);
    }
}
