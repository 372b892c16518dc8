use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{AppConfig, MonitoringData};
use crate::workflow::Selection;

mod config;
mod plotting;
mod report;
mod workflow;

#[derive(Parser)]
#[command(name = "groundwatch")]
#[command(about = "Heavy Metal Pollution Index calculation and groundwater monitoring reports", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to ./groundwatch.yaml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding standards, projects, samples and stored results
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Directory for JSON reports and charts
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Calculate the HMPI for samples that have not been calculated yet
    Calculate {
        /// Only (re)calculate this sample
        #[arg(short, long, conflicts_with = "all")]
        sample: Option<String>,

        /// Recalculate every sample
        #[arg(long)]
        all: bool,

        /// Name recorded as the analyst on each calculation
        #[arg(long)]
        analyst: Option<String>,
    },

    /// Water quality report over recent samples
    Report {
        #[arg(short, long)]
        project: Option<String>,

        #[arg(short, long, default_value_t = 30)]
        days: u32,
    },

    /// Compliance against the permissible limits, optionally for one region
    Compliance {
        /// Case-insensitive text matched against project locations
        #[arg(short, long)]
        region: Option<String>,
    },

    /// Regional risk, HMPI distribution and seasonal analytics
    Analytics {
        #[arg(short, long, default_value_t = 90)]
        days: u32,
    },

    /// Contamination alert management
    #[command(subcommand)]
    Alerts(AlertCommands),

    /// Show the permissible limits in use
    Standards,

    /// Headline monitoring figures
    Dashboard,

    /// Render contribution and HMPI timeline charts
    Plot {
        #[arg(short, long)]
        project: Option<String>,
    },
}

#[derive(Subcommand)]
enum AlertCommands {
    /// List alerts, newest first
    List {
        #[arg(short, long)]
        unresolved: bool,
    },

    /// Mark an alert as resolved
    Resolve {
        /// Alert ID
        alert_id: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "groundwatch_app=info,groundwatch_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    if let Some(output_dir) = cli.output_dir {
        config.output_dir = output_dir;
    }

    let data = MonitoringData::load(&config.data_dir)?;
    let today = chrono::Utc::now().date_naive();

    match cli.command {
        Commands::Calculate {
            sample,
            all,
            analyst,
        } => {
            if let Some(analyst) = analyst {
                config.analyst = analyst;
            }
            let selection = match (&sample, all) {
                (Some(id), _) => Selection::One(id),
                (None, true) => Selection::All,
                (None, false) => Selection::Pending,
            };
            workflow::run_calculations(&config, &data, selection)?;
        }
        Commands::Report { project, days } => {
            workflow::water_quality_report(&config, &data, project.as_deref(), days, today)?;
        }
        Commands::Compliance { region } => {
            workflow::compliance_report(&config, &data, region.as_deref(), today)?;
        }
        Commands::Analytics { days } => {
            workflow::analytics_report(&config, &data, days, today)?;
        }
        Commands::Alerts(AlertCommands::List { unresolved }) => {
            workflow::list_alerts(&config, unresolved)?;
        }
        Commands::Alerts(AlertCommands::Resolve { alert_id }) => {
            workflow::resolve_alert(&config, &alert_id)?;
        }
        Commands::Standards => workflow::print_standards(&config, &data)?,
        Commands::Dashboard => {
            workflow::dashboard(&config, &data)?;
        }
        Commands::Plot { project } => {
            workflow::generate_plots(&config, &data, project.as_deref())?;
        }
    }

    Ok(())
}
