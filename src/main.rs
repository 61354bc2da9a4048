use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, instrument, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use eu_state_aids::bg::{BgExportOptions, BgExporter, ProjectsFetcher};
use eu_state_aids::config::Config;
use eu_state_aids::it::measures::measure_periods;
use eu_state_aids::it::{ItExportOptions, ItExporter, MeasuresGenerator, RnaFetcher};
use eu_state_aids::period::YearMonth;
use eu_state_aids::summary::ExportReport;
use eu_state_aids::utils::validate_year;

#[derive(Parser)]
#[command(name = "eu-state-aids")]
#[command(version, about = "Fetch and export EU state aid data per country", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Bulgaria: 2020.eufunds.bg projects joined with the minfin.bg state aid register
    #[command(subcommand)]
    Bg(BgCommand),

    /// Italy: RNA open data joined with the measures table
    #[command(subcommand)]
    It(ItCommand),
}

#[derive(Args)]
struct BgPath {
    /// Directory holding the projects files and the output CSV
    #[arg(long, env = "BG_LOCAL_PATH", default_value = "./data/bg")]
    local_path: PathBuf,
}

#[derive(Args)]
struct ItPath {
    /// Directory holding the monthly archives, misure.csv and the output CSV
    #[arg(long, env = "IT_LOCAL_PATH", default_value = "./data/it")]
    local_path: PathBuf,
}

#[derive(Subcommand)]
enum BgCommand {
    /// Download the projects file of a year
    Fetch {
        /// Year (e.g., 2015)
        year: String,
        #[command(flatten)]
        path: BgPath,
    },

    /// Export the projects of a year that match a state aid scheme to <YEAR>.csv
    Export {
        /// Year (e.g., 2015)
        year: String,
        #[command(flatten)]
        path: BgPath,

        /// State aid register URL (default: the minfin.bg register)
        #[arg(long, env = "BG_STATEAID_URL")]
        stateaid_url: Option<String>,

        /// First year of the operational programs period
        #[arg(long, default_value = "2014")]
        program_start_year: String,
    },
}

#[derive(Subcommand)]
enum ItCommand {
    /// Build misure.csv from every published measures file
    GenerateMeasures {
        #[command(flatten)]
        path: ItPath,
    },

    /// Download the aids archive of a month
    Fetch {
        /// Month as YYYY_MM (e.g., 2019_03)
        period: String,
        #[command(flatten)]
        path: ItPath,
    },

    /// Export the aids of a year or month to <PERIOD>.csv
    Export {
        /// YYYY for a whole year or YYYY_MM for a single month
        period: String,
        #[command(flatten)]
        path: ItPath,

        /// Delete each monthly archive once it has been read
        #[arg(long)]
        delete_processed: bool,
    },
}

fn log_report(report: &ExportReport) {
    match &report.output {
        Some(path) => info!("{} rows written to {}", report.rows, path.display()),
        None => warn!("No matching records, no file written"),
    }
}

#[instrument(skip(command, config))]
async fn run_bg(command: BgCommand, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let fetcher = ProjectsFetcher::with_base_url(config.bg_projects_url.clone());

    match command {
        BgCommand::Fetch { year, path } => {
            let year = validate_year(&year)?;
            let saved = fetcher.fetch(year, &path.local_path).await?;
            info!("Projects for {year} saved to {}", saved.display());
        }
        BgCommand::Export {
            year,
            path,
            stateaid_url,
            program_start_year,
        } => {
            let stateaid_url = stateaid_url.unwrap_or_else(|| config.bg_stateaid_url.clone());
            let options =
                BgExportOptions::new(&year, path.local_path, &stateaid_url, &program_start_year)?;
            let report = BgExporter::new(fetcher).export(&options).await?;
            log_report(&report);
        }
    }
    Ok(())
}

#[instrument(skip(command, config))]
async fn run_it(command: ItCommand, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let fetcher = RnaFetcher::with_base_urls(
        config.it_aids_base_url.clone(),
        config.it_measures_base_url.clone(),
    );

    match command {
        ItCommand::GenerateMeasures { path } => {
            let report = MeasuresGenerator::new(fetcher)
                .generate(&measure_periods(), &path.local_path)
                .await?;
            log_report(&report);
        }
        ItCommand::Fetch { period, path } => {
            let period: YearMonth = period.parse()?;
            match fetcher.fetch_aids(period, &path.local_path).await? {
                Some(saved) => info!("Aids for {period} saved to {}", saved.display()),
                None => warn!("No aids file published for {period}"),
            }
        }
        ItCommand::Export {
            period,
            path,
            delete_processed,
        } => {
            let options = ItExportOptions::new(&period, path.local_path, delete_processed)?;
            let report = ItExporter::new(fetcher).export(&options).await?;
            log_report(&report);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing with environment filter support
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,eu_state_aids=debug")),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = Config::from_env();
    info!("Starting eu-state-aids with config: {:?}", config);

    match cli.command {
        Command::Bg(command) => run_bg(command, &config).await,
        Command::It(command) => run_it(command, &config).await,
    }
}
