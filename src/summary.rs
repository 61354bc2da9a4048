use std::path::PathBuf;
use tracing::{info, warn};

use crate::period::YearMonth;

/// What happened to one month of a multi-month run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeriodOutcome {
    /// Parsed; `rows` records survived filtering and joins
    Processed { rows: usize },
    /// The source has no file for this month
    NotFound,
    /// Transport or storage failure while fetching
    FetchFailed(String),
    /// The file was there but could not be read
    ParseFailed(String),
}

impl PeriodOutcome {
    pub fn is_processed(&self) -> bool {
        matches!(self, PeriodOutcome::Processed { .. })
    }
}

/// Per-month outcomes collected over one invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    outcomes: Vec<(YearMonth, PeriodOutcome)>,
}

impl RunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, period: YearMonth, outcome: PeriodOutcome) {
        match &outcome {
            PeriodOutcome::Processed { rows } => info!("{period}: {rows} rows"),
            PeriodOutcome::NotFound => warn!("{period}: file not found, skipping"),
            PeriodOutcome::FetchFailed(e) => warn!("{period}: fetch failed ({e}), skipping"),
            PeriodOutcome::ParseFailed(e) => warn!("{period}: parse failed ({e}), skipping"),
        }
        self.outcomes.push((period, outcome));
    }

    pub fn outcomes(&self) -> &[(YearMonth, PeriodOutcome)] {
        &self.outcomes
    }

    pub fn outcome(&self, period: YearMonth) -> Option<&PeriodOutcome> {
        self.outcomes
            .iter()
            .find(|(p, _)| *p == period)
            .map(|(_, outcome)| outcome)
    }

    pub fn processed(&self) -> usize {
        self.outcomes.iter().filter(|(_, o)| o.is_processed()).count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes.len() - self.processed()
    }

    pub fn rows(&self) -> usize {
        self.outcomes
            .iter()
            .map(|(_, o)| match o {
                PeriodOutcome::Processed { rows } => *rows,
                _ => 0,
            })
            .sum()
    }

    pub fn log(&self) {
        info!(
            "Run summary: {} periods processed, {} skipped, {} rows",
            self.processed(),
            self.skipped(),
            self.rows()
        );
    }
}

/// Result of an export command
#[derive(Debug, Clone, Default)]
pub struct ExportReport {
    /// Rows written to the output CSV
    pub rows: usize,
    /// Output file; `None` when nothing matched and no file was written
    pub output: Option<PathBuf>,
    pub summary: RunSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ym(year: i32, month: u32) -> YearMonth {
        YearMonth::new(year, month).unwrap()
    }

    #[test]
    fn test_summary_counts() {
        let mut summary = RunSummary::new();
        summary.record(ym(2020, 1), PeriodOutcome::Processed { rows: 4 });
        summary.record(ym(2020, 2), PeriodOutcome::NotFound);
        summary.record(ym(2020, 3), PeriodOutcome::Processed { rows: 0 });
        summary.record(ym(2020, 4), PeriodOutcome::ParseFailed("bad xml".into()));

        assert_eq!(summary.processed(), 2);
        assert_eq!(summary.skipped(), 2);
        assert_eq!(summary.rows(), 4);
        assert_eq!(summary.outcome(ym(2020, 2)), Some(&PeriodOutcome::NotFound));
        assert_eq!(summary.outcome(ym(2020, 5)), None);
    }

    #[test]
    fn test_empty_summary() {
        let summary = RunSummary::new();
        assert_eq!(summary.processed(), 0);
        assert_eq!(summary.skipped(), 0);
        assert!(summary.outcomes().is_empty());
    }
}
