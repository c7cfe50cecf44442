use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use clap::{Parser, Subcommand};

use drainwatch_service::config::{DEFAULT_CONFIG_PATH, ServiceConfig};
use drainwatch_service::ingest::{openweather, packet};
use drainwatch_service::logging::{self, Component};
use drainwatch_service::model::{ConfigError, StatusReport};
use drainwatch_service::simulate::{self, Simulator};
use drainwatch_service::FloodEngine;

#[derive(Parser)]
#[command(name = "drainwatch")]
#[command(about = "Flood risk scoring and control suggestions for urban drainage nodes", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest newline-delimited JSON packets and print the resulting status
    Replay {
        #[arg(long)]
        file: PathBuf,
    },
    /// Run the in-process sensor simulator
    Simulate {
        #[arg(long, default_value_t = 3)]
        cycles: usize,
        /// Skip the pause between cycles
        #[arg(long)]
        no_wait: bool,
    },
    /// Replay the demo week of daily rainfall through the classifier
    SimulateWeek,
    /// Print control suggestions for a location and risk score
    Suggest {
        #[arg(long)]
        location: String,
        #[arg(long)]
        risk: String,
    },
    /// Fetch current city weather, ingest it and print its assessment
    Live,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let config = ServiceConfig::load(&cli.config)?;
    logging::init_logger(
        config.log_level()?,
        config.logging.file.as_deref(),
        config.logging.console_timestamps,
    );
    logging::info(
        Component::System,
        None,
        &format!("Configuration loaded from {}", cli.config.display()),
    );

    let engine = FloodEngine::from_config(&config)?;

    match cli.command {
        Commands::Replay { file } => {
            let input = std::fs::read_to_string(&file)?;
            let parsed = packet::parse_packet_lines(&input);
            let total = parsed.len();
            let mut failed = 0;
            for (line, result) in parsed {
                match result.and_then(|reading| engine.ingest(reading)) {
                    Ok(()) => {}
                    Err(e) => {
                        failed += 1;
                        logging::log_engine_failure(
                            Component::Ingest,
                            None,
                            &format!("line {}", line),
                            &e,
                        );
                    }
                }
            }
            logging::log_cycle_summary(Component::Ingest, total, total - failed, failed);
            print_status(&engine, &engine.status(Utc::now()))?;
        }
        Commands::Simulate { cycles, no_wait } => {
            let mut sim = Simulator::new(config.simulator.seed);
            for i in 0..cycles {
                println!("\n--- Simulation cycle #{} ---", sim.cycle() + 1);
                for reading in sim.next_cycle() {
                    if let Err(e) = engine.ingest(reading) {
                        logging::log_engine_failure(Component::Simulator, None, "ingest", &e);
                    }
                }
                print_status(&engine, &engine.status(Utc::now()))?;
                if !no_wait && i + 1 < cycles {
                    std::thread::sleep(Duration::from_secs(config.simulator.interval_secs));
                }
            }
        }
        Commands::SimulateWeek => {
            let reports = simulate::replay_daily_series(
                engine.model(),
                simulate::demo_week_start(),
                &simulate::DEMO_WEEK,
            )?;
            println!("--- Daily flood predictions ---");
            for r in reports {
                let result = if r.flood { "FLOOD" } else { "No flood" };
                println!(
                    "Date: {} | Rain: {:>5.1} mm | Prediction: {} (Risk: {:.2})",
                    r.date, r.rain_mm, result, r.risk
                );
            }
        }
        Commands::Suggest { location, risk } => {
            let body = serde_json::json!({ "location_id": location, "risk_score": risk });
            let suggestions = engine.handle_suggestion_request(&body)?;
            println!("{}", serde_json::to_string_pretty(&suggestions)?);
        }
        Commands::Live => {
            let api_key = config.weather.api_key.as_deref().ok_or_else(|| {
                ConfigError::Invalid("OPENWEATHER_API_KEY is not set".to_string())
            })?;
            let client = reqwest::blocking::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()?;
            let reading = openweather::fetch_current(&client, &config.weather.city, api_key)?;
            logging::info(
                Component::Weather,
                Some(&reading.node_id),
                &format!("Current rainfall {} mm/hr", reading.rainfall_mm_per_hr),
            );
            let node_id = reading.node_id.clone();
            engine.ingest(reading)?;
            let assessment = engine.assess(&node_id, Utc::now())?;
            println!("{}", serde_json::to_string_pretty(&assessment)?);
            let suggestions = engine.suggestions(&node_id, assessment.risk_score);
            println!("{}", serde_json::to_string_pretty(&suggestions)?);
        }
    }

    Ok(())
}

/// Prints each assessed node and, where the node names a catalog location,
/// its control suggestions.
fn print_status(engine: &FloodEngine, report: &StatusReport) -> Result<(), serde_json::Error> {
    for (node_id, a) in &report.nodes {
        println!(
            "{:<20} {:<9} risk {:.2} flood {:<5} rain {:>6.2} mm/hr",
            node_id, a.scorer, a.risk_score, a.flood, a.live_data.rainfall_mm_per_hr
        );
        if engine.catalog().lookup(node_id).is_some() {
            for s in engine.suggestions(node_id, a.risk_score) {
                println!("    [{}] {}", s.priority, s.action);
                if let Some(payload) = &s.payload {
                    println!("        payload: {}", serde_json::to_string(payload)?);
                }
            }
        }
    }
    for (node_id, reason) in &report.failures {
        println!("{:<20} FAILED: {}", node_id, reason);
    }
    Ok(())
}
