/// Percentage of acknowledged chunks, rounded to the nearest integer.
///
/// An upload with no chunks reports 0.
pub fn progress_percent(acknowledged: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = (acknowledged.min(total) as f64 / total as f64) * 100.0;
    pct.round() as u8
}

/// Tracks acknowledged chunks for one upload attempt.
///
/// The reported percentage never decreases.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    total: u64,
    acknowledged: u64,
    last_percent: u8,
}

impl ProgressTracker {
    pub fn new(total: u64) -> Self {
        Self {
            total,
            acknowledged: 0,
            last_percent: 0,
        }
    }

    /// Records one more acknowledged chunk and returns the new percentage.
    pub fn acknowledge(&mut self) -> u8 {
        self.acknowledged = (self.acknowledged + 1).min(self.total);
        let pct = progress_percent(self.acknowledged, self.total);
        self.last_percent = self.last_percent.max(pct);
        self.last_percent
    }

    pub fn acknowledged(&self) -> u64 {
        self.acknowledged
    }

    pub fn percent(&self) -> u8 {
        self.last_percent
    }

    pub fn is_complete(&self) -> bool {
        self.acknowledged >= self.total
    }
}
