use std::{
    fs::{self, File},
    io,
    path::{Path, PathBuf},
    time::Duration,
};

use chrono::{Days, NaiveDate, NaiveDateTime, Timelike, Utc};
use thiserror::Error;
use tokio::{task::JoinHandle, time};
use tracing::{debug, info, warn};

use crate::logger::{LOG_FILE_PREFIX, LOG_FILE_SUFFIX};

const ARCHIVE_EXT: &str = "zst";
const PARTIAL_EXT: &str = "part";
const COMPRESSION_LEVEL: i32 = 3;

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Log directory unreadable: {0}")]
    ReadDir(#[source] io::Error),
    #[error("Failed to compress {path}: {source}")]
    Compress {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to remove {path}: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveReport {
    pub compressed: usize,
    pub pruned: usize,
    pub discarded: usize,
}

/// Compresses rotated audit logs with zstd and drops archives past retention.
#[derive(Debug, Clone)]
pub struct LogArchiver {
    dir: PathBuf,
    prefix: String,
    suffix: String,
    retention_days: u64,
}

impl LogArchiver {
    pub fn new(dir: impl Into<PathBuf>, retention_days: u64) -> Self {
        Self {
            dir: dir.into(),
            prefix: LOG_FILE_PREFIX.to_string(),
            suffix: LOG_FILE_SUFFIX.to_string(),
            retention_days,
        }
    }

    /// One compaction pass. The file for the hour containing `now` is still
    /// being written and is left alone. Partial archives left by an
    /// interrupted pass are deleted; their source log is still in place and
    /// gets compressed again.
    pub fn compact(&self, now: NaiveDateTime) -> Result<ArchiveReport, ArchiveError> {
        let today = now.date();
        let current_hour = now.hour();
        let cutoff = today
            .checked_sub_days(Days::new(self.retention_days))
            .unwrap_or(NaiveDate::MIN);
        let mut report = ArchiveReport::default();

        // listed up front so this pass never sees its own output
        let paths = fs::read_dir(&self.dir)
            .map_err(ArchiveError::ReadDir)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(ArchiveError::ReadDir)?;

        for path in paths {
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if self.is_partial(name) {
                match fs::remove_file(&path) {
                    Ok(()) => {
                        warn!("Removed interrupted log archive {}", path.display());
                        report.discarded += 1;
                    }
                    // already replaced by a compression earlier in this pass
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                    Err(source) => {
                        return Err(ArchiveError::Remove {
                            path: path.clone(),
                            source,
                        });
                    }
                }
                continue;
            }
            let Some((date, hour, archived)) = self.parse_name(name) else {
                continue;
            };

            if archived {
                if date < cutoff {
                    fs::remove_file(&path).map_err(|source| ArchiveError::Remove {
                        path: path.clone(),
                        source,
                    })?;
                    debug!("Pruned expired log archive {}", path.display());
                    report.pruned += 1;
                }
            } else if (date, hour) < (today, current_hour) {
                compress(&path)?;
                debug!("Compressed rotated log {}", path.display());
                report.compressed += 1;
            }
        }

        Ok(report)
    }

    /// Runs [`compact`](Self::compact) immediately and then on every tick.
    /// Failures are logged and never stop the loop.
    pub fn spawn(self, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = time::interval(every);
            loop {
                interval.tick().await;

                let archiver = self.clone();
                let now = Utc::now().naive_utc();
                match tokio::task::spawn_blocking(move || archiver.compact(now)).await {
                    Ok(Ok(report)) if report != ArchiveReport::default() => info!(
                        "Log archive: compressed {}, pruned {}, discarded {}",
                        report.compressed, report.pruned, report.discarded
                    ),
                    Ok(Ok(_)) => {}
                    Ok(Err(e)) => warn!("Log archive pass failed: {}", e),
                    Err(e) => warn!("Log archive task aborted: {}", e),
                }
            }
        })
    }

    /// `webhook.2026-10-18-13.log.zst.part`
    fn is_partial(&self, name: &str) -> bool {
        name.strip_prefix(self.prefix.as_str())
            .and_then(|rest| rest.strip_suffix(PARTIAL_EXT))
            .and_then(|rest| rest.strip_suffix('.'))
            .and_then(|rest| rest.strip_suffix(ARCHIVE_EXT))
            .is_some_and(|rest| rest.ends_with('.'))
    }

    /// `webhook.2026-10-18-13.log` -> (date, 13, false),
    /// `webhook.2026-10-18-13.log.zst` -> (date, 13, true)
    fn parse_name(&self, name: &str) -> Option<(NaiveDate, u32, bool)> {
        let rest = name.strip_prefix(self.prefix.as_str())?.strip_prefix('.')?;
        let (rest, archived) = match rest
            .strip_suffix(ARCHIVE_EXT)
            .and_then(|r| r.strip_suffix('.'))
        {
            Some(r) => (r, true),
            None => (rest, false),
        };
        let period = rest.strip_suffix(self.suffix.as_str())?.strip_suffix('.')?;
        let (date, hour) = period.rsplit_once('-')?;
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
        if hour.len() != 2 {
            return None;
        }
        let hour = hour.parse::<u32>().ok().filter(|h| *h < 24)?;
        Some((date, hour, archived))
    }
}

fn compress(path: &Path) -> Result<(), ArchiveError> {
    let compress_err = |source| ArchiveError::Compress {
        path: path.to_path_buf(),
        source,
    };

    let mut target = path.as_os_str().to_owned();
    target.push(".");
    target.push(ARCHIVE_EXT);
    let target = PathBuf::from(target);
    let mut partial = target.clone().into_os_string();
    partial.push(".");
    partial.push(PARTIAL_EXT);
    let partial = PathBuf::from(partial);

    let input = File::open(path).map_err(compress_err)?;
    let output = File::create(&partial).map_err(compress_err)?;
    zstd::stream::copy_encode(input, output, COMPRESSION_LEVEL).map_err(compress_err)?;
    fs::rename(&partial, &target).map_err(compress_err)?;

    fs::remove_file(path).map_err(|source| ArchiveError::Remove {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    #[test]
    fn test_parse_name() {
        let archiver = LogArchiver::new("/tmp", 7);

        assert_eq!(
            archiver.parse_name("webhook.2026-10-18-13.log"),
            Some((day("2026-10-18"), 13, false))
        );
        assert_eq!(
            archiver.parse_name("webhook.2026-10-18-00.log.zst"),
            Some((day("2026-10-18"), 0, true))
        );
        assert_eq!(archiver.parse_name("webhook.2026-10-18-13.log.zst.part"), None);
        assert_eq!(archiver.parse_name("other.2026-10-18-13.log"), None);
        assert_eq!(archiver.parse_name("webhook.2026-10-18.log"), None);
        assert_eq!(archiver.parse_name("webhook.2026-10-18-24.log"), None);
        assert_eq!(archiver.parse_name("webhook.yesterday-01.log"), None);
    }

    #[test]
    fn test_compact_compresses_rotated_and_prunes_expired() {
        let dir = tempfile::tempdir().unwrap();
        let rotated = dir.path().join("webhook.2026-10-17-22.log");
        let earlier_today = dir.path().join("webhook.2026-10-19-08.log");
        let current = dir.path().join("webhook.2026-10-19-09.log");
        let expired = dir.path().join("webhook.2026-10-01-12.log.zst");
        let recent = dir.path().join("webhook.2026-10-15-12.log.zst");
        let unrelated = dir.path().join("notes.txt");

        fs::write(&rotated, "signal received\n").unwrap();
        fs::write(&earlier_today, "order sent\n").unwrap();
        fs::write(&current, "still writing\n").unwrap();
        fs::write(&expired, b"old").unwrap();
        fs::write(&recent, b"recent").unwrap();
        fs::write(&unrelated, "keep").unwrap();

        let archiver = LogArchiver::new(dir.path(), 7);
        let report = archiver.compact(at("2026-10-19 09:30")).unwrap();

        assert_eq!(
            report,
            ArchiveReport {
                compressed: 2,
                pruned: 1,
                discarded: 0
            }
        );
        assert!(!rotated.exists());
        assert!(!earlier_today.exists());
        assert!(current.exists());
        assert!(!expired.exists());
        assert!(recent.exists());
        assert!(unrelated.exists());

        let archived = fs::read(dir.path().join("webhook.2026-10-17-22.log.zst")).unwrap();
        let restored = zstd::stream::decode_all(archived.as_slice()).unwrap();
        assert_eq!(restored, b"signal received\n");
    }

    #[test]
    fn test_compact_discards_interrupted_archive() {
        let dir = tempfile::tempdir().unwrap();
        let rotated = dir.path().join("webhook.2026-10-17-10.log");
        let partial = dir.path().join("webhook.2026-10-16-10.log.zst.part");
        let orphan = dir.path().join("webhook.2026-09-01-10.log.zst.part");
        let foreign = dir.path().join("upload.zst.part");

        fs::write(&rotated, "order sent\n").unwrap();
        fs::write(&partial, b"truncated").unwrap();
        fs::write(&orphan, b"truncated").unwrap();
        fs::write(&foreign, b"keep").unwrap();

        let archiver = LogArchiver::new(dir.path(), 7);
        let report = archiver.compact(at("2026-10-19 09:30")).unwrap();

        assert_eq!(
            report,
            ArchiveReport {
                compressed: 1,
                pruned: 0,
                discarded: 2
            }
        );
        assert!(!partial.exists());
        assert!(!orphan.exists());
        assert!(foreign.exists());

        let archived = fs::read(dir.path().join("webhook.2026-10-17-10.log.zst")).unwrap();
        let restored = zstd::stream::decode_all(archived.as_slice()).unwrap();
        assert_eq!(restored, b"order sent\n");
    }

    #[test]
    fn test_is_partial() {
        let archiver = LogArchiver::new("/tmp", 7);

        assert!(archiver.is_partial("webhook.2026-10-18-13.log.zst.part"));
        assert!(!archiver.is_partial("webhook.2026-10-18-13.log.zst"));
        assert!(!archiver.is_partial("webhook.2026-10-18-13.log"));
        assert!(!archiver.is_partial("other.2026-10-18-13.log.zst.part"));
    }

    #[test]
    fn test_compact_missing_dir_is_an_error() {
        let archiver = LogArchiver::new("/nonexistent/webhook-logs", 7);
        assert!(matches!(
            archiver.compact(at("2026-10-19 09:30")),
            Err(ArchiveError::ReadDir(_))
        ));
    }
}
