use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{info, instrument};

use super::code::normalize_code;
use super::fetcher::RnaFetcher;
use super::ItError;
use crate::importers::downloader::ensure_dir;
use crate::importers::xml_archive::{path_ends_with, walk_xml, XmlVisitor};
use crate::importers::{ArchiveError, XmlArchive};
use crate::output::{write_csv, OutputError};
use crate::period::YearMonth;
use crate::summary::{ExportReport, PeriodOutcome, RunSummary};

pub const MEASURES_FILENAME: &str = "misure.csv";

pub const FIRST_MEASURES_PERIOD: YearMonth = YearMonth { year: 2014, month: 5 };
pub const LAST_MEASURES_PERIOD: YearMonth = YearMonth { year: 2021, month: 12 };

/// Months the mirror never published
pub const KNOWN_MISSING_PERIODS: [YearMonth; 2] = [
    YearMonth { year: 2021, month: 8 },
    YearMonth { year: 2021, month: 10 },
];

/// Every month with a published measures file
pub fn measure_periods() -> Vec<YearMonth> {
    YearMonth::range_inclusive(FIRST_MEASURES_PERIOD, LAST_MEASURES_PERIOD)
        .into_iter()
        .filter(|period| !KNOWN_MISSING_PERIODS.contains(period))
        .collect()
}

/// A measure code with one of its co-financing funds
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Measure {
    pub cod_ce: String,
    pub fondo_desc: String,
}

#[derive(Default)]
struct MeasureBuilder {
    code: String,
    funds: Vec<String>,
}

#[derive(Default)]
struct MeasuresVisitor {
    current: Option<MeasureBuilder>,
    rows: Vec<Measure>,
}

impl XmlVisitor for MeasuresVisitor {
    fn start(&mut self, path: &[String]) {
        match path.last().map(String::as_str) {
            Some("MISURA") => self.current = Some(MeasureBuilder::default()),
            Some("COFINANZIAMENTO") => {
                if let Some(measure) = self.current.as_mut() {
                    measure.funds.push(String::new());
                }
            }
            _ => {}
        }
    }

    fn text(&mut self, path: &[String], text: &str) {
        let Some(measure) = self.current.as_mut() else {
            return;
        };
        if path_ends_with(path, &["MISURA", "COD_CE"]) {
            measure.code.push_str(text);
        } else if path_ends_with(path, &["COFINANZIAMENTO", "DESCRIZIONE_FONDO"]) {
            if let Some(fund) = measure.funds.last_mut() {
                fund.push_str(text);
            }
        }
    }

    fn end(&mut self, path: &[String]) {
        if path.last().map(String::as_str) != Some("MISURA") {
            return;
        }
        let Some(measure) = self.current.take() else {
            return;
        };
        let Some(cod_ce) = normalize_code(&measure.code) else {
            return;
        };
        for fondo_desc in measure.funds.into_iter().filter(|f| !f.is_empty()) {
            self.rows.push(Measure {
                cod_ce: cod_ce.clone(),
                fondo_desc,
            });
        }
    }
}

/// Flatten an `OpenData_Misura` document into one row per co-financing fund.
///
/// Measures without a normalisable code, without co-financing or with an
/// empty fund description produce no rows.
pub fn parse_measures(xml: &str) -> Result<Vec<Measure>, ArchiveError> {
    let mut visitor = MeasuresVisitor::default();
    walk_xml(xml, &mut visitor)?;
    Ok(visitor.rows)
}

/// Distinct (code, fund description) pairs, in first-seen order
#[derive(Debug, Clone, Default)]
pub struct MeasuresTable {
    rows: Vec<Measure>,
    seen: HashSet<Measure>,
}

impl MeasuresTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pair; returns false when it was already there
    pub fn insert(&mut self, measure: Measure) -> bool {
        if self.seen.contains(&measure) {
            return false;
        }
        self.seen.insert(measure.clone());
        self.rows.push(measure);
        true
    }

    /// Add pairs, returning how many were new
    pub fn extend(&mut self, measures: impl IntoIterator<Item = Measure>) -> usize {
        measures
            .into_iter()
            .map(|m| self.insert(m))
            .filter(|added| *added)
            .count()
    }

    pub fn rows(&self) -> &[Measure] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Fund descriptions per code, in table order
    pub fn index(&self) -> HashMap<&str, Vec<&str>> {
        let mut index: HashMap<&str, Vec<&str>> = HashMap::new();
        for measure in &self.rows {
            index
                .entry(measure.cod_ce.as_str())
                .or_default()
                .push(measure.fondo_desc.as_str());
        }
        index
    }

    /// Read a `misure.csv` written by [`MeasuresTable::write`]; rows with an
    /// empty field are skipped
    pub fn read(path: &Path) -> Result<Self, ItError> {
        let csv_error = |source| ItError::Measures {
            path: path.to_path_buf(),
            source,
        };

        let mut reader = csv::Reader::from_path(path).map_err(csv_error)?;
        let mut table = Self::new();
        for record in reader.deserialize::<Measure>() {
            let measure = record.map_err(csv_error)?;
            if !measure.cod_ce.is_empty() && !measure.fondo_desc.is_empty() {
                table.insert(measure);
            }
        }
        Ok(table)
    }

    pub fn write(&self, path: &Path) -> Result<(), OutputError> {
        write_csv(path, &self.rows)
    }
}

/// Builds `misure.csv` out of every monthly measures archive
#[derive(Clone, Default)]
pub struct MeasuresGenerator {
    fetcher: RnaFetcher,
}

impl MeasuresGenerator {
    pub fn new(fetcher: RnaFetcher) -> Self {
        Self { fetcher }
    }

    /// Scan `periods` in order and write the distinct pairs to
    /// `local_path/misure.csv`.
    ///
    /// A month that cannot be fetched or parsed is logged and skipped; the
    /// file is not written when no pair was found.
    #[instrument(skip(self, periods, local_path), fields(periods = periods.len()))]
    pub async fn generate(
        &self,
        periods: &[YearMonth],
        local_path: &Path,
    ) -> Result<ExportReport, ItError> {
        ensure_dir(local_path)?;
        info!("Fetching all misure files");

        let pb = ProgressBar::new(periods.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("##-"),
        );

        let mut table = MeasuresTable::new();
        let mut summary = RunSummary::new();

        for &period in periods {
            pb.set_message(period.to_string());
            let outcome = self.process_period(period, &mut table).await;
            summary.record(period, outcome);
            pb.inc(1);
        }
        pb.finish_with_message(format!("{} measures", table.len()));

        summary.log();
        info!("{} records found.", table.len());
        if table.is_empty() {
            return Ok(ExportReport {
                summary,
                ..Default::default()
            });
        }

        let csv_path = local_path.join(MEASURES_FILENAME);
        info!("Writing results to {}", csv_path.display());
        table.write(&csv_path)?;

        Ok(ExportReport {
            rows: table.len(),
            output: Some(csv_path),
            summary,
        })
    }

    async fn process_period(&self, period: YearMonth, table: &mut MeasuresTable) -> PeriodOutcome {
        let bytes = match self.fetcher.download_measures(period).await {
            Ok(bytes) => bytes,
            Err(e) if e.is_unavailable() => return PeriodOutcome::NotFound,
            Err(e) => return PeriodOutcome::FetchFailed(e.to_string()),
        };

        match XmlArchive::read_bytes(bytes).and_then(|xml| parse_measures(&xml)) {
            Ok(measures) => PeriodOutcome::Processed {
                rows: table.extend(measures),
            },
            Err(e) => PeriodOutcome::ParseFailed(e.to_string()),
        }
    }
}
