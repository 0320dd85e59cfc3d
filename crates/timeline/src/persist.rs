use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// The flag expires after this, the transmission can then play again.
const RETENTION_DAYS: i64 = 365;
const FILE_NAME: &str = "timeline-reset.ron";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("could not serialize played flag: {0}")]
    Serialize(#[from] ron::Error),
    #[error("could not write played flag to {path}: {err}")]
    Write {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },
    #[error("could not remove played flag at {path}: {err}")]
    Remove {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },
}

#[derive(Debug, Serialize, Deserialize)]
struct Stored {
    played: bool,
    written_at_ms: i64,
}

/// Stores the "transmission already played" flag as a little ron file.
/// Absence of the file means not yet played; so does anything unreadable,
/// which the next save simply overwrites.
#[derive(Debug, Clone)]
pub struct PlayedFlag {
    path: PathBuf,
}

impl PlayedFlag {
    pub fn new(dir: &Path) -> Self {
        Self {
            path: dir.join(FILE_NAME),
        }
    }

    /// Where the flag lives when the user does not pick a directory.
    pub fn default_dir() -> Option<PathBuf> {
        dirs::data_local_dir()
    }

    pub fn load(&self, now: Timestamp) -> bool {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => return false,
            Err(err) => {
                warn!(
                    "could not read played flag at {}, assuming not played: {err}",
                    self.path.display()
                );
                return false;
            }
        };

        let stored: Stored = match ron::from_str(&content) {
            Ok(stored) => stored,
            Err(err) => {
                warn!(
                    "played flag at {} is corrupt, assuming not played: {err}",
                    self.path.display()
                );
                return false;
            }
        };

        let age_ms = now.as_millisecond() - stored.written_at_ms;
        stored.played && age_ms <= RETENTION_DAYS * 24 * 60 * 60 * 1000
    }

    pub fn save(&self, now: Timestamp) -> Result<(), Error> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|err| Error::Write {
                path: self.path.clone(),
                err,
            })?;
        }

        let stored = Stored {
            played: true,
            written_at_ms: now.as_millisecond(),
        };
        let serialized = ron::to_string(&stored)?;
        fs::write(&self.path, serialized).map_err(|err| Error::Write {
            path: self.path.clone(),
            err,
        })
    }

    pub fn clear(&self) -> Result<(), Error> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(Error::Remove {
                path: self.path.clone(),
                err,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_flag(name: &str) -> PlayedFlag {
        let dir = std::env::temp_dir()
            .join("timeline-persist-tests")
            .join(format!("{name}-{}", std::process::id()));
        let flag = PlayedFlag::new(&dir);
        flag.clear().unwrap();
        flag
    }

    fn ts(s: &str) -> Timestamp {
        s.parse().unwrap()
    }

    #[test]
    fn save_load_clear_round_trip() {
        let flag = temp_flag("round-trip");
        let now = ts("2025-11-01T00:00:00Z");

        assert!(!flag.load(now), "missing file means not played");
        flag.save(now).unwrap();
        assert!(flag.load(now));
        flag.clear().unwrap();
        assert!(!flag.load(now));
    }

    #[test]
    fn flag_expires_after_retention() {
        let flag = temp_flag("expiry");
        flag.save(ts("2025-11-01T00:00:00Z")).unwrap();

        assert!(flag.load(ts("2026-10-31T00:00:00Z")), "within retention"); // 364 days
        assert!(!flag.load(ts("2026-11-02T00:00:00Z")), "past retention"); // 366 days
    }

    #[test]
    fn garbage_file_counts_as_not_played() {
        let flag = temp_flag("garbage");
        let now = ts("2025-11-01T00:00:00Z");
        fs::create_dir_all(flag.path.parent().unwrap()).unwrap();
        fs::write(&flag.path, "definitely not ron {{{").unwrap();

        assert!(!flag.load(now));
        // the next save overwrites the garbage
        flag.save(now).unwrap();
        assert!(flag.load(now));
    }

    #[test]
    fn clearing_a_missing_flag_is_fine() {
        let flag = temp_flag("clear-missing");
        flag.clear().unwrap();
        flag.clear().unwrap();
    }
}
