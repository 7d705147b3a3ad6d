//! joypuppet - puppeteer an emulated game controller
//!
//! Console REPL by default; `--midi` drives the same commands from a
//! connected MIDI device.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use joypuppet::cli::ControllerCli;
use joypuppet::config::AppConfig;
use joypuppet::controller::ControllerState;
use joypuppet::midi::input::{self, MidiInputStream};
use joypuppet::translator::MidiTranslator;
use joypuppet::transport::{ConsoleTransport, Transport};

/// Puppeteer an emulated game controller from a console REPL or a MIDI device
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Drive the session from a MIDI device instead of the console
    #[arg(long)]
    midi: bool,

    /// MIDI input port name pattern (overrides the config file)
    #[arg(long)]
    midi_port: Option<String>,

    /// List available MIDI input ports
    #[arg(long)]
    list_ports: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_logging(&args.log_level)?;

    info!("Starting joypuppet...");

    if args.list_ports {
        list_ports_formatted()?;
        return Ok(());
    }

    let config = AppConfig::load(&args.config)?;

    let transport: Arc<dyn Transport> = Arc::new(ConsoleTransport::new());
    let mut cli = ControllerCli::new(ControllerState::new(), transport)?;

    if args.midi {
        let pattern = args
            .midi_port
            .as_deref()
            .unwrap_or(&config.midi.input_port);
        let mut stream = MidiInputStream::connect(pattern)?;
        let mut translator = MidiTranslator::new(
            config.translator.mappings.clone(),
            config.translator.settings(),
        );

        tokio::select! {
            result = cli.run_midi(&mut stream, &mut translator, config.midi.poll_interval()) => result?,
            _ = shutdown_signal() => {}
        }
    } else {
        cli.run_console().await?;
    }

    info!("joypuppet shutdown complete");
    Ok(())
}

fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .init();

    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C signal handler");
    info!("Shutdown signal received");
}

fn list_ports_formatted() -> Result<()> {
    println!("\n{}", "Available MIDI input ports:".bold().cyan());

    let ports = input::list_input_ports()?;
    if ports.is_empty() {
        println!("  (none)");
    }
    for (i, name) in ports.iter().enumerate() {
        println!("  [{}] {}", i, name.green());
    }

    Ok(())
}
