/// Counter record for one scan. Mutated monotonically while scanning; read
/// once at the end for the summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScanStats {
    /// Messages pulled from the source, counted before classification.
    pub checked: u64,
    /// Messages removed by successful bulk-delete calls.
    pub deleted: u64,
    /// Preserved because they carry media.
    pub kept_media: u64,
    /// Preserved because they are dated today.
    pub kept_today: u64,
    /// Preserved because they have neither text nor media.
    pub kept_other: u64,
    /// Messages in bulk-delete calls that failed as a unit.
    pub errors: u64,
}

impl ScanStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages preserved for any reason.
    pub fn total_kept(&self) -> u64 {
        self.kept_media + self.kept_today + self.kept_other
    }

    /// Every checked message must land in exactly one counter.
    pub fn is_balanced(&self) -> bool {
        self.checked == self.deleted + self.errors + self.total_kept()
    }

    pub fn has_deletions(&self) -> bool {
        self.deleted > 0
    }
}
