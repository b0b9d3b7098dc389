use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, Level};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use lorawatch::fetch::DataFetcher;
use lorawatch::model::ConfigReport;
use lorawatch::scheduler::RefreshScheduler;
use lorawatch::status::format_report;
use lorawatch::web::start_view_server;

#[derive(Parser)]
#[command(name = "lorawatch")]
#[command(about = "Polling status and alert dashboard for a LoRaWAN fleet monitor", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the backend continuously and serve the rendered dashboard
    Watch {
        /// Base URL of the monitoring backend
        #[arg(short, long, default_value = "http://localhost:5000")]
        backend_url: String,

        /// Interval between refresh cycles in seconds
        #[arg(short, long, default_value = "300")]
        interval: u64,

        /// Port for the rendered dashboard view
        #[arg(short, long, default_value = "8080")]
        port: u16,

        /// Also poll link metrics for this device uid
        #[arg(short, long)]
        device: Option<String>,

        /// Path to store log files
        #[arg(short, long, default_value = "logs")]
        log_dir: PathBuf,
    },
    /// Run a single refresh cycle and emit the rendered page
    Once {
        /// Base URL of the monitoring backend
        #[arg(short, long, default_value = "http://localhost:5000")]
        backend_url: String,

        /// Also poll link metrics for this device uid
        #[arg(short, long)]
        device: Option<String>,

        /// Write the page here instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// One-shot configuration check against the backend
    Check {
        /// Base URL of the monitoring backend
        #[arg(short, long, default_value = "http://localhost:5000")]
        backend_url: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Watch {
            backend_url,
            interval,
            port,
            device,
            log_dir,
        } => {
            // Set up logging
            std::fs::create_dir_all(&log_dir)?;
            let file_appender = RollingFileAppender::new(Rotation::HOURLY, &log_dir, "lorawatch.log");
            let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

            tracing_subscriber::registry()
                .with(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
                .with(fmt::layer().with_writer(std::io::stdout))
                .with(fmt::layer().json().with_writer(non_blocking))
                .init();

            info!("Starting LoRaWAN fleet watch");
            info!("Backend: {}", backend_url);
            info!("Refresh interval: {}s", interval);
            info!("Dashboard view: http://localhost:{}", port);

            let fetcher = DataFetcher::new(&backend_url)?;
            let scheduler = RefreshScheduler::new(fetcher, device);

            // Serve the rendered view in the background
            let view_scheduler = scheduler.clone();
            tokio::spawn(async move {
                if let Err(e) = start_view_server(view_scheduler, port).await {
                    tracing::error!("View server error: {}", e);
                }
            });

            // Drive refresh cycles until interrupted
            let refresh_scheduler = scheduler.clone();
            tokio::spawn(async move {
                refresh_scheduler.start(Duration::from_secs(interval)).await;
            });

            tokio::signal::ctrl_c().await?;
            info!("Shutting down...");
            Ok(())
        }
        Commands::Once { backend_url, device, out } => {
            tracing_subscriber::registry()
                .with(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();

            let fetcher = DataFetcher::new(&backend_url)?;
            let scheduler = RefreshScheduler::new(fetcher, device);
            scheduler.run_once().await;

            let page = scheduler.render_page();
            match out {
                Some(path) => {
                    std::fs::write(&path, page)?;
                    println!("Wrote dashboard to {:?}", path);
                }
                None => println!("{}", page),
            }
            Ok(())
        }
        Commands::Check { backend_url } => {
            tracing_subscriber::registry()
                .with(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();

            let fetcher = DataFetcher::new(&backend_url)?;
            match fetcher.fetch_json::<ConfigReport>("/config_check").await {
                Some(report) => {
                    print!("{}", format_report(&report));
                    Ok(())
                }
                None => anyhow::bail!("configuration check failed: backend unreachable or malformed response"),
            }
        }
    }
}
