use std::path::PathBuf;

use airwatch::{config::Config, service::Assessor, shutdown::Shutdown};
use chrono::Local;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "airwatch")]
#[command(about = "Periodic air quality assessment for one location")]
struct Args {
    /// TOML configuration file; defaults apply without one.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Assess once and exit.
    #[arg(long)]
    once: bool,

    /// Print each report as JSON on stdout.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();

    // Logging isn't configured until the config is read; report config errors plainly.
    let config = match Config::load(args.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            airwatch::init_logging("info");
            tracing::error!("{e}");
            std::process::exit(2);
        }
    };
    airwatch::init_logging(&config.log_level);

    let mut assessor = match Assessor::from_config(&config) {
        Ok(a) => a,
        Err(e) => {
            tracing::error!("{e}");
            std::process::exit(2);
        }
    };

    if args.once {
        let report = assessor.assess(&Local::now());
        if args.json {
            airwatch::print_json(&report);
        }
        if let Err(e) = report.aqi() {
            tracing::error!("{e}");
            std::process::exit(1);
        }
        return;
    }

    let shutdown = Shutdown::new();
    {
        let shutdown = shutdown.clone();
        let handler = ctrlc::set_handler(move || {
            tracing::info!("got SIGINT, shutting down");
            shutdown.request();
        });
        if let Err(e) = handler {
            tracing::error!("could not set SIGINT handler: {e}");
            std::process::exit(2);
        }
    }

    airwatch::run(&shutdown, &mut assessor, &config, args.json);
    tracing::info!("shut down");
}
