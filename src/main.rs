use analytics::HeatmapService;
use clap::{Parser, Subcommand, ValueEnum};
use comfy_table::{Table, presets::UTF8_FULL};
use configuration::{Config, LoggingSettings};
use core_types::HeatmapMatrix;
use dataset::CsvSource;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// The main entry point for the index heatmap application.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Environment overrides (HEATMAP__...) may live in a .env file.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut config = load_settings(&cli.config)?;
    if let Some(data) = cli.data {
        config.dataset.path = data;
    }
    let _log_guard = configuration::init_tracing(&config.logging)?;

    let service = load_service(&config)
        .inspect_err(|e| tracing::error!(error = %e, path = ?config.dataset.path, "Failed to load dataset."))?;

    // Execute the appropriate command
    match cli.command {
        Commands::Serve(args) => {
            if let Some(port) = args.port {
                config.server.port = port;
            }
            let addr = config.server.socket_addr()?;
            web_server::run_server(addr, Arc::new(service)).await?;
        }
        Commands::Indices => {
            for name in service.index_names() {
                println!("{name}");
            }
        }
        Commands::Heatmap(args) => handle_heatmap(&service, args)?,
        Commands::Summary(args) => handle_summary(&service, &args.index)?,
        Commands::Report(args) => {
            let report = service.report(&args.index, args.forward_period.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Monthly return heatmaps and cross-index rankings for a daily index price file.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file. Defaults apply when it does not exist.
    #[arg(long, global = true, default_value = configuration::DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// CSV file to load instead of `dataset.path` from the configuration.
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the heatmap API over HTTP.
    Serve(ServeArgs),
    /// List the index names found in the dataset.
    Indices,
    /// Print one heatmap matrix as a year x month table.
    Heatmap(HeatmapArgs),
    /// Print the trailing average return and the rank percentiles of an index.
    Summary(IndexArgs),
    /// Print the full report of an index as JSON.
    Report(ReportArgs),
}

#[derive(Parser)]
struct ServeArgs {
    /// Overrides `server.port` from the configuration.
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Parser)]
struct IndexArgs {
    /// The index column name, e.g. "NIFTY 50".
    #[arg(long)]
    index: String,
}

#[derive(Parser)]
struct HeatmapArgs {
    /// The index column name, e.g. "NIFTY 50".
    #[arg(long)]
    index: String,

    /// Which matrix to print. Defaults to `forward` when a forward period is given
    /// and to `mom` otherwise.
    #[arg(long, value_enum)]
    metric: Option<Metric>,

    /// Forward horizon: 1M, 3M, 6M, 1Y, 2Y, 3Y or 4Y.
    #[arg(long)]
    forward_period: Option<String>,
}

#[derive(Parser)]
struct ReportArgs {
    /// The index column name, e.g. "NIFTY 50".
    #[arg(long)]
    index: String,

    /// Forward horizon for the `heatmap` field: 1M, 3M, 6M, 1Y, 2Y, 3Y or 4Y.
    #[arg(long)]
    forward_period: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Metric {
    /// Month-over-month returns.
    Mom,
    /// Forward returns over `--forward-period`.
    Forward,
    /// Monthly average prices.
    Price,
    /// Monthly rank among all indices, 1 being best.
    Rank,
}

// ==============================================================================
// Command Logic
// ==============================================================================

/// Loads the configuration, logging the failure before returning it.
///
/// The logging section is part of what failed, so the error is reported through a
/// subscriber built from the default logging settings.
fn load_settings(path: &Path) -> anyhow::Result<Config> {
    configuration::load_config(path).map_err(|e| {
        // Fails only when a subscriber is already installed, which is fine to reuse.
        let _ = configuration::init_tracing(&LoggingSettings::default());
        tracing::error!(error = %e, path = ?path, "Failed to load configuration.");
        e.into()
    })
}

fn load_service(config: &Config) -> anyhow::Result<HeatmapService> {
    let source = CsvSource::new(&config.dataset.path, &config.dataset.date_column);
    let table = source.load()?;
    Ok(HeatmapService::new(table))
}

fn handle_heatmap(service: &HeatmapService, args: HeatmapArgs) -> anyhow::Result<()> {
    let metric = args.metric.unwrap_or(match args.forward_period {
        Some(_) => Metric::Forward,
        None => Metric::Mom,
    });

    let table = match metric {
        Metric::Mom => render_matrix(&service.heatmap_matrix(&args.index)?, format_return),
        Metric::Forward => {
            let Some(period) = args.forward_period.as_deref() else {
                anyhow::bail!("--forward-period is required for the forward metric");
            };
            render_matrix(
                &service.forward_return_matrix(&args.index, period)?,
                format_return,
            )
        }
        Metric::Price => render_matrix(
            &service.monthly_price_matrix(&args.index)?,
            |p| format!("{p:.2}"),
        ),
        Metric::Rank => render_matrix(
            &service.monthly_rank_matrix(&args.index)?,
            |r| r.to_string(),
        ),
    };

    println!("{}", args.index);
    println!("{table}");
    Ok(())
}

fn handle_summary(service: &HeatmapService, index: &str) -> anyhow::Result<()> {
    let avg = service.avg_monthly_return_3y(index)?;
    let rank = service.rank_percentile_4y(index)?;
    let inverse = service.inverse_rank_percentile(index)?;

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Metric", "Value"]);
    table.add_row(vec![
        "Avg monthly return (3Y)".to_string(),
        avg.map_or_else(|| "-".to_string(), format_return),
    ]);
    table.add_row(vec![
        "Rank percentile (4Y)".to_string(),
        rank.map_or_else(|| "-".to_string(), |p| format!("{p:.2}")),
    ]);
    table.add_row(vec![
        "Inverse rank percentile".to_string(),
        inverse.map_or_else(|| "-".to_string(), |p| format!("{p:.2}")),
    ]);

    println!("{index}");
    println!("{table}");
    Ok(())
}

/// Years as rows, months 1-12 as columns. Missing and absent cells print as `-`.
fn render_matrix<T: Copy>(matrix: &HeatmapMatrix<T>, format: impl Fn(T) -> String) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);

    let mut header = vec!["Year".to_string()];
    header.extend((1..=12).map(|m| m.to_string()));
    table.set_header(header);

    for (year, months) in matrix.rows() {
        let mut row = vec![year.to_string()];
        row.extend((1..=12).map(|m| match months.get(&m) {
            Some(Some(value)) => format(*value),
            _ => "-".to_string(),
        }));
        table.add_row(row);
    }
    table
}

fn format_return(r: f64) -> String {
    format!("{:+.2}%", r * 100.0)
}
