//! apk-polkit mock CLI
//!
//! Entry point for the `apk-polkit-mock` command-line tool.

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use apk_polkit_mock::mock::{MockPackageService, MockState, SystemClock};
use apk_polkit_mock::{serve_stdio, EffectiveConfig, ServiceConfig};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::info;

#[derive(Parser)]
#[command(name = "apk-polkit-mock")]
#[command(about = "Stateful mock of the apk-polkit package helper", version)]
struct Cli {
    /// API generation to serve (v1 or v2)
    #[arg(long, global = true)]
    api: Option<String>,

    /// Path to a TOML config file
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Length of one simulated time unit in milliseconds
    #[arg(long, global = true)]
    time_unit_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve requests as line-delimited JSON
    Serve {
        /// Serve a single client on stdin/stdout (default)
        #[arg(long, conflicts_with = "socket")]
        stdio: bool,

        /// Listen on a Unix socket instead
        #[arg(long)]
        socket: Option<PathBuf>,
    },

    /// Print the method table of the selected API
    Methods {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Print the seeded fixture state as JSON
    Fixtures,
}

fn main() {
    let cli = Cli::parse();

    let socket = match &cli.command {
        Commands::Serve { socket, .. } => socket.clone(),
        _ => None,
    };
    let overrides = json!({
        "api_version": cli.api,
        "time_unit_ms": cli.time_unit_ms,
        "socket": socket,
    });
    let config = match load_config(cli.config.as_deref(), overrides) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            process::exit(1);
        }
    };

    init_tracing(&config.log_level);

    match cli.command {
        Commands::Serve { stdio, .. } => run_serve(&config, stdio),
        Commands::Methods { json } => run_methods(&config, json),
        Commands::Fixtures => run_fixtures(&config),
    }
}

fn load_config(
    path: Option<&std::path::Path>,
    overrides: serde_json::Value,
) -> Result<ServiceConfig, apk_polkit_mock::ConfigError> {
    EffectiveConfig::build(path, Some(overrides))?.service_config()
}

/// Logs go to stderr; stdout carries responses in stdio mode.
fn init_tracing(fallback: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(fallback)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn build_service(config: &ServiceConfig) -> MockPackageService {
    MockPackageService::with_settings(config.api_version, config.settings(), Arc::new(SystemClock))
}

fn run_serve(config: &ServiceConfig, stdio: bool) {
    let service = build_service(config);
    info!(
        api = %config.api_version,
        bus_name = config.api_version.bus_name(),
        time_unit_ms = config.time_unit_ms,
        "starting mock helper"
    );

    let result = match (&config.socket, stdio) {
        (Some(path), false) => serve_socket(path, service),
        _ => serve_stdio(&service).map(|_| ()),
    };

    if let Err(e) = result {
        eprintln!("Server error: {}", e);
        process::exit(1);
    }
}

#[cfg(unix)]
fn serve_socket(
    path: &std::path::Path,
    service: MockPackageService,
) -> Result<(), apk_polkit_mock::ServerError> {
    let server = apk_polkit_mock::server::SocketServer::bind(path, service)?;
    if let Err(e) = apk_polkit_mock::signal::install(server.shutdown_handle()) {
        tracing::warn!(error = %e, "failed to install signal handler");
    }
    server.run()
}

#[cfg(not(unix))]
fn serve_socket(
    _path: &std::path::Path,
    _service: MockPackageService,
) -> Result<(), apk_polkit_mock::ServerError> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "Unix sockets are not available on this platform",
    )
    .into())
}

fn run_methods(config: &ServiceConfig, as_json: bool) {
    let service = build_service(config);
    let api = service.api();

    if as_json {
        let methods: Vec<_> = service
            .methods()
            .iter()
            .map(|m| {
                json!({
                    "interface": m.interface_name(api),
                    "name": m.name,
                    "in_signature": m.in_signature,
                    "out_signature": m.out_signature,
                })
            })
            .collect();
        print_json(&json!({ "api": api, "bus_name": api.bus_name(), "methods": methods }));
        return;
    }

    let bus = if api.system_bus() { "system" } else { "session" };
    println!("{} {} ({} bus)", api.bus_name(), api.object_path(), bus);
    for m in service.methods().iter() {
        println!(
            "  {:<26} {}({}) -> {}",
            m.interface_name(api),
            m.name,
            m.in_signature,
            if m.out_signature.is_empty() { "()" } else { m.out_signature }
        );
    }
}

fn run_fixtures(config: &ServiceConfig) {
    let state = MockState::seeded(config.api_version);
    let packages: Vec<_> = state
        .packages()
        .map(|p| {
            json!({
                "package": p,
                "newest_version": state.newest_version(&p.name),
            })
        })
        .collect();
    print_json(&json!({
        "api": config.api_version,
        "repositories": state.repositories(),
        "packages": packages,
    }));
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => {
            eprintln!("Error serializing output: {}", e);
            process::exit(1);
        }
    }
}
