//! Writes a copy of the transaction list to disk every time it is saved.
//!
//! Files are grouped by day: `Keuangan/2024-01-05/2024-01-05_10-15-30.json`.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};

use time::{OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description};

use crate::{Error, codec::export_transactions, timezone::get_offset_at, transaction::Transaction};

/// The folder all backups are written under.
const BACKUP_FOLDER: &str = "Keuangan";

const FOLDER_DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

const FILE_TIMESTAMP_FORMAT: &[BorrowedFormatItem] =
    format_description!("[year]-[month]-[day]_[hour]-[minute]-[second]");

/// The file name for an export made at `local_now`, e.g.
/// "2024-01-05_10-15-30.json".
///
/// # Errors
/// Returns [Error::DateFormatError] if the timestamp cannot be formatted.
pub fn export_file_name(local_now: OffsetDateTime) -> Result<String, Error> {
    Ok(format!("{}.json", local_now.format(FILE_TIMESTAMP_FORMAT)?))
}

/// The path, relative to the backup directory, of a backup made at
/// `local_now`.
///
/// # Errors
/// Returns [Error::DateFormatError] if the timestamp cannot be formatted.
pub fn backup_path(local_now: OffsetDateTime) -> Result<PathBuf, Error> {
    let folder_date = local_now.format(FOLDER_DATE_FORMAT)?;

    Ok(Path::new(BACKUP_FOLDER)
        .join(folder_date)
        .join(export_file_name(local_now)?))
}

/// Writes export files under a root directory.
///
/// Writes are serialised by a lock owned by the writer, so two saves racing
/// each other produce two complete files rather than one garbled one.
#[derive(Debug)]
pub struct BackupWriter {
    root: PathBuf,
    local_timezone: String,
    lock: Mutex<()>,
}

impl BackupWriter {
    /// Create a writer that puts backups under `root`, naming them by the
    /// time in `local_timezone`.
    ///
    /// # Errors
    /// Returns [Error::InvalidTimezoneError] if `local_timezone` is not a
    /// known canonical timezone name.
    pub fn new(root: impl Into<PathBuf>, local_timezone: &str) -> Result<Self, Error> {
        if time_tz::timezones::get_by_name(local_timezone).is_none() {
            return Err(Error::InvalidTimezoneError(local_timezone.to_owned()));
        }

        Ok(Self {
            root: root.into(),
            local_timezone: local_timezone.to_owned(),
            lock: Mutex::new(()),
        })
    }

    /// Export `transactions` to a new file named after `now` and return its
    /// path.
    ///
    /// A file never overwrites an earlier backup: when two backups land in the
    /// same second the later one gets a numeric suffix.
    ///
    /// # Errors
    /// Returns an error if the lock is poisoned, the transactions cannot be
    /// serialised or the file cannot be written.
    pub fn write(
        &self,
        transactions: &[Transaction],
        now: OffsetDateTime,
    ) -> Result<PathBuf, Error> {
        let _guard = self.lock.lock().map_err(|_| Error::BackupLockError)?;

        let local_offset = get_offset_at(&self.local_timezone, now)
            .ok_or_else(|| Error::InvalidTimezoneError(self.local_timezone.clone()))?;
        let path = self.root.join(backup_path(now.to_offset(local_offset))?);

        if let Some(folder) = path.parent() {
            fs::create_dir_all(folder)?;
        }

        let contents = export_transactions(transactions)?;
        let path = unused_path(path);
        fs::write(&path, contents)?;

        tracing::info!(
            "Backed up {} transaction(s) to {}",
            transactions.len(),
            path.display()
        );

        Ok(path)
    }
}

fn unused_path(path: PathBuf) -> PathBuf {
    if !path.exists() {
        return path;
    }

    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();

    (1..)
        .map(|suffix| path.with_file_name(format!("{stem}_{suffix}.json")))
        .find(|candidate| !candidate.exists())
        .unwrap_or(path)
}

#[cfg(test)]
mod backup_tests {
    use std::{fs, path::PathBuf};

    use time::macros::datetime;

    use crate::{
        Error,
        backup::{BackupWriter, backup_path, export_file_name},
        transaction::{Transaction, TransactionType},
    };

    fn transactions() -> Vec<Transaction> {
        vec![
            Transaction::new(
                TransactionType::Income,
                "Gaji",
                5_000_000.0,
                datetime!(2024-01-01 02:00 UTC),
            ),
            Transaction::new(
                TransactionType::Expense,
                "Makan",
                50_000.0,
                datetime!(2024-01-02 05:00 UTC),
            ),
        ]
    }

    #[test]
    fn path_groups_by_day() {
        let got = backup_path(datetime!(2024-01-05 10:15:30 +7)).unwrap();

        assert_eq!(
            got,
            PathBuf::from("Keuangan/2024-01-05/2024-01-05_10-15-30.json")
        );
    }

    #[test]
    fn file_name_carries_timestamp() {
        assert_eq!(
            export_file_name(datetime!(2024-12-31 23:59:01 UTC)).unwrap(),
            "2024-12-31_23-59-01.json"
        );
    }

    #[test]
    fn rejects_unknown_timezone() {
        let dir = tempfile::tempdir().unwrap();

        let got = BackupWriter::new(dir.path(), "Mars/Olympus_Mons");

        assert!(matches!(got, Err(Error::InvalidTimezoneError(_))));
    }

    #[test]
    fn writes_export_in_local_time_folder() {
        let dir = tempfile::tempdir().unwrap();
        let writer = BackupWriter::new(dir.path(), "Asia/Jakarta").unwrap();
        let transactions = transactions();

        let path = writer
            .write(&transactions, datetime!(2024-01-04 20:00:00 UTC))
            .unwrap();

        assert_eq!(
            path,
            dir.path()
                .join("Keuangan/2024-01-05/2024-01-05_03-00-00.json")
        );
        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents,
            crate::codec::export_transactions(&transactions).unwrap()
        );
    }

    #[test]
    fn same_second_writes_do_not_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let writer = BackupWriter::new(dir.path(), "Etc/UTC").unwrap();
        let now = datetime!(2024-01-05 10:15:30 UTC);

        let first = writer.write(&transactions(), now).unwrap();
        let second = writer.write(&[], now).unwrap();

        assert_ne!(first, second);
        assert!(second.ends_with("2024-01-05_10-15-30_1.json"));
        assert_eq!(fs::read_to_string(second).unwrap(), "[]");
    }
}
