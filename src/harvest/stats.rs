//! Counters for one harvest run.

use super::ItemOutcome;

/// Statistics from a harvest run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HarvestStats {
    /// Papers downloaded in this run.
    pub downloaded: usize,
    /// Papers whose download failed on every attempt.
    pub download_failed: usize,
    /// Papers skipped because their PDF already existed.
    pub already_on_disk: usize,
    /// Papers skipped because they were in the history.
    pub already_seen: usize,
    /// Papers skipped as published before the cutoff year.
    pub too_old: usize,
    /// Items that hit an unexpected error.
    pub item_errors: usize,
    /// Queries that returned results.
    pub queries_completed: usize,
    /// Queries that failed.
    pub queries_failed: usize,
}

impl HarvestStats {
    /// Counts one item outcome.
    pub fn record(&mut self, outcome: ItemOutcome) {
        let counter = match outcome {
            ItemOutcome::Downloaded => &mut self.downloaded,
            ItemOutcome::DownloadFailed => &mut self.download_failed,
            ItemOutcome::AlreadyOnDisk => &mut self.already_on_disk,
            ItemOutcome::AlreadySeen => &mut self.already_seen,
            ItemOutcome::TooOld => &mut self.too_old,
        };
        *counter += 1;
    }

    /// Number of items looked at across all queries.
    #[must_use]
    pub fn items_seen(&self) -> usize {
        self.downloaded
            + self.download_failed
            + self.already_on_disk
            + self.already_seen
            + self.too_old
            + self.item_errors
    }
}
