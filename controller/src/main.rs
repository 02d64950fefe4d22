//! Signage Controller - Entry Point
//!
//! Serves the operator UI and API that push videos to the display fleet.

use std::collections::HashMap;
use std::env;
use std::process::ExitCode;
use std::sync::Arc;

use colored::Colorize;
use tracing::{error, info};

use signage_controller::app::options::AppOptions;
use signage_controller::app::run::run;
use signage_controller::deploy::Dispatcher;
use signage_controller::exec::ProcessRunner;
use signage_controller::filesys::file::File;
use signage_controller::logs::{init_logging, LogOptions};
use signage_controller::storage::settings::Settings;
use signage_controller::utils::version_info;

const DEFAULT_CONFIG: &str = "signage.json";

#[tokio::main]
async fn main() -> ExitCode {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let mut cli_args: HashMap<String, String> = HashMap::new();

    for arg in args.iter().skip(1) {
        if let Some((key, value)) = arg.split_once('=') {
            let clean_key = key.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), value.to_string());
        } else if arg.starts_with("--") {
            let clean_key = arg.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), "true".to_string());
        }
    }

    if cli_args.contains_key("version") {
        match serde_json::to_string_pretty(&version_info()) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("Failed to render version info: {e}"),
        }
        return ExitCode::SUCCESS;
    }

    let config_file = File::new(
        cli_args
            .get("config")
            .cloned()
            .unwrap_or_else(|| DEFAULT_CONFIG.to_string()),
    );

    // Write the default settings and exit
    if cli_args.contains_key("init-config") {
        if config_file.exists().await {
            eprintln!("{} already exists", config_file.path().display());
            return ExitCode::FAILURE;
        }
        return match config_file.write_json(&Settings::default()).await {
            Ok(()) => {
                println!("Wrote default settings to {}", config_file.path().display());
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Unable to write settings: {e}");
                ExitCode::FAILURE
            }
        };
    }

    let mut settings = match Settings::load(&config_file).await {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Unable to read settings file {}: {}", config_file.path().display(), e);
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = settings.apply_env(env::var("PORT").ok().as_deref()) {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    // Initialize logging
    let log_options = LogOptions {
        log_level: settings.log_level,
        log_dir: settings.log_dir.clone(),
        json_format: settings.log_json,
        ..Default::default()
    };
    let _log_guard = match init_logging(log_options) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            None
        }
    };

    let options = match settings.to_app_options() {
        Ok(options) => options,
        Err(e) => {
            error!("Invalid settings in {}: {}", config_file.path().display(), e);
            return ExitCode::FAILURE;
        }
    };

    if cli_args.contains_key("probe") {
        return probe(&options).await;
    }

    info!("Running Signage Controller with options: {:?}", options);
    match run(options, await_shutdown_signal()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Failed to run the controller: {e}");
            ExitCode::FAILURE
        }
    }
}

/// One-shot connectivity check, printed as a table
async fn probe(options: &AppOptions) -> ExitCode {
    let dispatcher = Dispatcher::new(
        Arc::new(options.fleet.clone()),
        Arc::new(options.remote.clone()),
        Arc::new(ProcessRunner),
    );
    let report = dispatcher.probe_fleet().await;

    for result in &report.summary {
        let status = if result.ok {
            "reachable".green().bold()
        } else {
            "unreachable".red().bold()
        };
        let detail = result.error.as_deref().unwrap_or_default();
        println!("{:<16} {:<18} {:<12} {}", result.endpoint, result.host, status, detail.dimmed());
    }

    if report.ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).expect("Failed to listen for SIGTERM");
        let mut sigint = signal(SignalKind::interrupt()).expect("Failed to listen for SIGINT");

        tokio::select! {
            _ = sigterm.recv() => {
                info!("SIGTERM received, shutting down...");
            }
            _ = sigint.recv() => {
                info!("SIGINT received, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
        info!("Ctrl+C received, shutting down...");
    }
}
