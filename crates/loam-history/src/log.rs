use std::path::PathBuf;

use loam_commit::Commit;
use loam_store::document;
use loam_types::ObjectId;
use tracing::debug;

use crate::error::{HistoryError, HistoryResult};
use crate::record::HistoryRecord;

/// The append-only history document.
#[derive(Debug, Clone)]
pub struct HistoryLog {
    path: PathBuf,
}

impl HistoryLog {
    /// A log stored at `path`. A missing file is an empty log.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load(&self) -> HistoryResult<Vec<HistoryRecord>> {
        Ok(document::read_json_or_default(&self.path)?)
    }

    /// Append a record for `commit`, listing all of its files as changed.
    pub fn record(&self, commit: &Commit, branch: &str) -> HistoryResult<HistoryRecord> {
        let files = commit.files.iter().map(|f| f.path.clone()).collect();
        self.record_with_changes(commit, branch, files)
    }

    /// Append a record for `commit` with an explicit changed-file list.
    pub fn record_with_changes(
        &self,
        commit: &Commit,
        branch: &str,
        files_changed: Vec<String>,
    ) -> HistoryResult<HistoryRecord> {
        let mut records = self.load()?;
        let record = HistoryRecord::new(commit, branch, files_changed);
        records.push(record.clone());
        document::write_json_atomic(&self.path, &records)?;
        debug!(
            commit = %commit.hash.short_hex(),
            branch,
            seq = records.len(),
            "history recorded"
        );
        Ok(record)
    }

    /// Records, newest first, optionally filtered by branch and truncated.
    ///
    /// Equal timestamps are ordered by append position, later first.
    pub fn query(&self, branch: Option<&str>, limit: Option<usize>) -> HistoryResult<Vec<HistoryRecord>> {
        let mut rows: Vec<(usize, HistoryRecord)> = self
            .load()?
            .into_iter()
            .enumerate()
            .filter(|(_, r)| branch.map_or(true, |b| r.branch == b))
            .collect();
        rows.sort_by(|(ia, a), (ib, b)| b.timestamp.cmp(&a.timestamp).then(ib.cmp(ia)));

        let iter = rows.into_iter().map(|(_, r)| r);
        Ok(match limit {
            Some(n) => iter.take(n).collect(),
            None => iter.collect(),
        })
    }

    /// The first record for `hash`.
    pub fn by_hash(&self, hash: &ObjectId) -> HistoryResult<HistoryRecord> {
        self.load()?
            .into_iter()
            .find(|r| r.hash == *hash)
            .ok_or_else(|| HistoryError::NotFound(hash.to_hex()))
    }

    /// The newest record, optionally on one branch.
    pub fn latest(&self, branch: Option<&str>) -> HistoryResult<Option<HistoryRecord>> {
        Ok(self.query(branch, Some(1))?.into_iter().next())
    }

    /// Number of records.
    pub fn len(&self) -> HistoryResult<usize> {
        Ok(self.load()?.len())
    }

    /// Returns `true` if nothing has been recorded.
    pub fn is_empty(&self) -> HistoryResult<bool> {
        Ok(self.len()? == 0)
    }
}
