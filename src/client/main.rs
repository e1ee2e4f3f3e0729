// src/client/main.rs

use std::process::ExitCode;

use chrono::Utc;

use activation::client::codec::StoreCodec;
use activation::client::format::JsonActivationFormat;
use activation::client::server::HttpLicenseServer;
use activation::client::storage::{PersistedStore, SecureStore};
use activation::client::ActivationResolver;
use activation::config::{init_config, ActivationConfig};
use activation::errors::LicenseResult;

const USAGE: &str = "usage: activation_client [LICENSE_KEY | --clear]";

/// What the binary was asked to do.
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Resolve,
    StoreKeyAndResolve(String),
    Clear,
    Help,
}

/// Parse the single optional argument. Unknown flags are rejected so a
/// mistyped option never ends up stored as the license key.
fn parse_command(arg: Option<&str>) -> Result<Command, String> {
    match arg.map(str::trim) {
        None => Ok(Command::Resolve),
        Some("-h") | Some("--help") => Ok(Command::Help),
        Some("--clear") => Ok(Command::Clear),
        Some(flag) if flag.starts_with('-') => Err(format!("unknown option '{flag}'")),
        Some("") => Err("license key cannot be empty".to_string()),
        Some(key) => Ok(Command::StoreKeyAndResolve(key.to_string())),
    }
}

/// Resolve and print the current activation.
///
/// - `activation_client` uses the stored activation, reactivating online
///   when it is missing or expired.
/// - `activation_client LIC-XXXX-...` stores the license key first.
/// - `activation_client --clear` removes the stored activation.
///
/// Exits with 0 when an activation was obtained, 1 otherwise, and 2 on
/// configuration or usage errors.
fn main() -> ExitCode {
    let command = match parse_command(std::env::args().nth(1).as_deref()) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("error: {e}");
            eprintln!("{USAGE}");
            return ExitCode::from(2);
        }
    };

    if command == Command::Help {
        println!("{USAGE}");
        return ExitCode::SUCCESS;
    }

    let config = match init_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {e}");
            return ExitCode::from(2);
        }
    };

    init_logging(config);

    match run(config, command) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(config: &ActivationConfig) {
    if !config.logging.enabled {
        return;
    }

    let level = config
        .logging
        .level
        .parse::<tracing::Level>()
        .unwrap_or(tracing::Level::INFO);

    // try_init so a subscriber installed by an embedding host wins
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(config: &ActivationConfig, command: Command) -> LicenseResult<ExitCode> {
    let store = SecureStore::new(config.storage.service.clone(), &config.storage.app_dir);
    let codec = StoreCodec::from_config(config.storage.encrypted, &config.storage.encryption_seed);
    let server = HttpLicenseServer::from_config(&config.server)?;

    let resolver =
        ActivationResolver::new(&store, codec, JsonActivationFormat, server).configure(config);

    match command {
        Command::Help => {
            println!("{USAGE}");
            return Ok(ExitCode::SUCCESS);
        }
        Command::Clear => {
            resolver.clear_stored_activation()?;
            println!("Stored activation cleared");
            return Ok(ExitCode::SUCCESS);
        }
        Command::StoreKeyAndResolve(key) => {
            store.write_persisted_string(&resolver.entries().license_key, &key)?;
            tracing::info!("stored license key");
        }
        Command::Resolve => {}
    }

    let now = Utc::now();
    let outcome = resolver.get_activation_at(now);

    Ok(outcome.match_with(
        |activation| {
            println!("Licensed to: {}", activation.licensee);
            println!("License key: {}", activation.key);
            println!("Activated until: {}", activation.activated_until);
            if let Some(left) = activation.remaining(now) {
                println!("Offline use left: {}h {}m", left.num_hours(), left.num_minutes() % 60);
            }
            println!("License expires: {}", activation.license_expires);
            if activation.is_license_expired(now) {
                eprintln!("Warning: the license has expired, renew it before the activation runs out.");
            }
            ExitCode::SUCCESS
        },
        |reason| {
            eprintln!("No activation: {reason}");
            if reason.requires_online() {
                eprintln!("Connect to the license server to reactivate.");
            }
            ExitCode::FAILURE
        },
    ))
}
