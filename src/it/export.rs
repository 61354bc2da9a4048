use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, instrument};

use super::aids::{parse_aids, AidRecord};
use super::code::normalize_code;
use super::fetcher::{aids_archive_name, RnaFetcher};
use super::measures::{MeasuresTable, MEASURES_FILENAME};
use super::ItError;
use crate::importers::downloader::ensure_dir;
use crate::importers::XmlArchive;
use crate::output::{serialize_amount, write_csv};
use crate::period::{Period, YearMonth};
use crate::summary::{ExportReport, PeriodOutcome, RunSummary};
use crate::utils::ValidationError;

/// Output row of `it export`: the total of one beneficiary under one
/// measure and fund
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AidTotal {
    pub cf_benef: String,
    pub denom_benef: String,
    pub cod_ce: String,
    pub fondo_desc: String,
    #[serde(serialize_with = "serialize_amount")]
    pub componenti_importo_aiuto: f64,
}

/// An aid record joined with one fund of its measure
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedAid {
    pub cod_ce: String,
    pub fondo_desc: String,
    pub denom_benef: Option<String>,
    pub cf_benef: Option<String>,
    pub importo: Option<String>,
}

/// Inner join of aid records with the measures index on the normalised
/// code. An aid matching a code with several funds yields one row per fund.
pub fn match_measures(records: Vec<AidRecord>, index: &HashMap<&str, Vec<&str>>) -> Vec<MatchedAid> {
    let mut matched = Vec::new();
    for record in records {
        let Some(cod_ce) = record.cod_ce.as_deref().and_then(normalize_code) else {
            continue;
        };
        let Some(funds) = index.get(cod_ce.as_str()) else {
            continue;
        };
        for fondo_desc in funds {
            matched.push(MatchedAid {
                cod_ce: cod_ce.clone(),
                fondo_desc: fondo_desc.to_string(),
                denom_benef: record.denom_benef.clone(),
                cf_benef: record.cf_benef.clone(),
                importo: record.importo.clone(),
            });
        }
    }
    matched
}

fn parse_amount(value: &str) -> Result<f64, ItError> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| ItError::InvalidAmount(value.to_string()))
}

/// Matched rows accumulated over the months of a period
#[derive(Debug, Default)]
pub struct AidCollector {
    rows: Vec<MatchedAid>,
}

impl AidCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, rows: impl IntoIterator<Item = MatchedAid>) {
        self.rows.extend(rows);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sum amounts per (cf_benef, denom_benef, cod_ce, fondo_desc), sorted by
    /// that key.
    ///
    /// Rows with a missing beneficiary field are dropped; a missing amount
    /// counts as zero. An amount that is not a number fails the whole run.
    pub fn into_totals(self) -> Result<Vec<AidTotal>, ItError> {
        let mut groups: BTreeMap<(String, String, String, String), f64> = BTreeMap::new();

        for row in self.rows {
            let (Some(cf_benef), Some(denom_benef)) = (row.cf_benef, row.denom_benef) else {
                continue;
            };
            let amount = match row.importo.as_deref() {
                Some(value) => parse_amount(value)?,
                None => 0.0,
            };
            *groups
                .entry((cf_benef, denom_benef, row.cod_ce, row.fondo_desc))
                .or_insert(0.0) += amount;
        }

        Ok(groups
            .into_iter()
            .map(
                |((cf_benef, denom_benef, cod_ce, fondo_desc), componenti_importo_aiuto)| AidTotal {
                    cf_benef,
                    denom_benef,
                    cod_ce,
                    fondo_desc,
                    componenti_importo_aiuto,
                },
            )
            .collect())
    }
}

/// Validated arguments of `it export`
#[derive(Debug, Clone)]
pub struct ItExportOptions {
    pub period: Period,
    pub local_path: PathBuf,
    pub delete_processed: bool,
}

impl ItExportOptions {
    pub fn new(
        period: &str,
        local_path: impl Into<PathBuf>,
        delete_processed: bool,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            period: period.parse()?,
            local_path: local_path.into(),
            delete_processed,
        })
    }

    pub fn output_path(&self) -> PathBuf {
        self.local_path.join(format!("{}.csv", self.period))
    }
}

/// The Italy export pipeline
#[derive(Clone, Default)]
pub struct ItExporter {
    fetcher: RnaFetcher,
}

impl ItExporter {
    pub fn new(fetcher: RnaFetcher) -> Self {
        Self { fetcher }
    }

    /// Join every month of the period with `misure.csv`, aggregate per
    /// beneficiary and write `<period>.csv`.
    ///
    /// Months that cannot be fetched or parsed are skipped. Nothing is
    /// written when no aid matches a measure.
    #[instrument(skip(self, options), fields(period = %options.period))]
    pub async fn export(&self, options: &ItExportOptions) -> Result<ExportReport, ItError> {
        ensure_dir(&options.local_path)?;

        let measures_path = options.local_path.join(MEASURES_FILENAME);
        let measures = MeasuresTable::read(&measures_path)?;
        info!(
            "Misure table read from {} ({} rows)",
            measures_path.display(),
            measures.len()
        );
        let index = measures.index();

        let mut collector = AidCollector::new();
        let mut summary = RunSummary::new();
        for period in options.period.months() {
            let outcome = self
                .process_month(period, options, &index, &mut collector)
                .await?;
            summary.record(period, outcome);
        }

        summary.log();
        info!("{} matches found.", collector.len());
        if collector.is_empty() {
            return Ok(ExportReport {
                summary,
                ..Default::default()
            });
        }

        let totals = collector.into_totals()?;
        if totals.is_empty() {
            info!("No aid with a complete beneficiary, nothing to write");
            return Ok(ExportReport {
                summary,
                ..Default::default()
            });
        }

        let csv_path = options.output_path();
        info!("Writing results to {}", csv_path.display());
        write_csv(&csv_path, &totals)?;

        Ok(ExportReport {
            rows: totals.len(),
            output: Some(csv_path),
            summary,
        })
    }

    async fn process_month(
        &self,
        period: YearMonth,
        options: &ItExportOptions,
        index: &HashMap<&str, Vec<&str>>,
        collector: &mut AidCollector,
    ) -> Result<PeriodOutcome, ItError> {
        let archive = options.local_path.join(aids_archive_name(period));
        if !archive.exists() {
            info!("{} not found locally", archive.display());
            match self.fetcher.fetch_aids(period, &options.local_path).await {
                Ok(Some(_)) => {}
                Ok(None) => return Ok(PeriodOutcome::NotFound),
                Err(e) => return Ok(PeriodOutcome::FetchFailed(e.to_string())),
            }
        }

        info!("Processing {}", archive.display());
        let records = match XmlArchive::read_file(&archive).and_then(|xml| parse_aids(&xml)) {
            Ok(records) => records,
            Err(e) => {
                error!("Error {e} while parsing {}, skipping", archive.display());
                return Ok(PeriodOutcome::ParseFailed(e.to_string()));
            }
        };

        if options.delete_processed {
            remove_archive(&archive)?;
        }

        let matched = match_measures(records, index);
        let rows = matched.len();
        info!("{rows} records with matching cod_ce found in file");
        collector.extend(matched);

        Ok(PeriodOutcome::Processed { rows })
    }
}

fn remove_archive(path: &Path) -> Result<(), ItError> {
    info!("Removing {}", path.display());
    fs::remove_file(path).map_err(|source| ItError::Io {
        path: path.to_path_buf(),
        source,
    })
}
