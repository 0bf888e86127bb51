use std::collections::BTreeMap;
use std::fmt;

/// Why a row did not produce a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SkipReason {
    Header,
    BlankRow,
    InvalidTimestamp,
    InvalidValue,
    MissingInstallation,
}

impl SkipReason {
    pub fn display_name(&self) -> &'static str {
        match self {
            SkipReason::Header => "header",
            SkipReason::BlankRow => "blank row",
            SkipReason::InvalidTimestamp => "invalid date/time",
            SkipReason::InvalidValue => "invalid value",
            SkipReason::MissingInstallation => "missing installation",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Per-source counters: how many files and rows were used and why the rest were not
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadReport {
    pub files_read: usize,
    /// Files ignored as a whole (no installation token in the name)
    pub files_skipped: usize,
    pub rows_accepted: usize,
    pub skipped: BTreeMap<SkipReason, usize>,
}

impl ReadReport {
    pub fn record_skip(&mut self, reason: SkipReason) {
        *self.skipped.entry(reason).or_default() += 1;
    }

    pub fn record_accepted(&mut self) {
        self.rows_accepted += 1;
    }

    pub fn skipped(&self, reason: SkipReason) -> usize {
        self.skipped.get(&reason).copied().unwrap_or(0)
    }

    /// Skipped rows excluding headers
    pub fn rows_rejected(&self) -> usize {
        self.skipped
            .iter()
            .filter(|(reason, _)| **reason != SkipReason::Header)
            .map(|(_, count)| count)
            .sum()
    }

    pub fn merge(&mut self, other: &ReadReport) {
        self.files_read += other.files_read;
        self.files_skipped += other.files_skipped;
        self.rows_accepted += other.rows_accepted;
        for (reason, count) in &other.skipped {
            *self.skipped.entry(*reason).or_default() += count;
        }
    }

    pub fn summary_line(&self) -> String {
        let mut line = format!(
            "{} files read, {} skipped, {} rows accepted, {} rows rejected",
            self.files_read,
            self.files_skipped,
            self.rows_accepted,
            self.rows_rejected()
        );
        let details: Vec<String> = self
            .skipped
            .iter()
            .filter(|(reason, _)| **reason != SkipReason::Header)
            .map(|(reason, count)| format!("{}: {}", reason, count))
            .collect();
        if !details.is_empty() {
            line.push_str(&format!(" ({})", details.join(", ")));
        }
        line
    }
}

/// Records produced by a loader together with its read report
#[derive(Debug, Clone)]
pub struct Loaded<T> {
    pub data: T,
    pub report: ReadReport,
}

impl<T> Loaded<T> {
    pub fn new(data: T, report: ReadReport) -> Self {
        Self { data, report }
    }
}
