// Copyright 2022 Matthew Ingwersen.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you
// may not use this file except in compliance with the License. You may
// obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or
// implied. See the License for the specific language governing
// permissions and limitations under the License.

//! Implements the `run` command (i.e., running the server).

use std::fmt::Write;
use std::path::PathBuf;
use std::process;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::{Context, Result};
use env_logger::Env;
use log::{error, info};
use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use tokio::runtime::Runtime;

use apex::io::TokioIoProvider;
use apex::server::Server;
use apex::zone::AuthoritativeResolver;

use crate::args::RunArgs;
use crate::config::{self, Config};

/// Runs the server.
pub fn run(args: RunArgs) {
    env_logger::init_from_env(Env::new().default_filter_or("info"));

    if let Err(e) = try_running(args) {
        error!("{}", describe_error("Failed to run:", &e));
        error!("Exiting with failure.");
        process::exit(1);
    }
    info!("Exiting with success.");
}

fn try_running(run_args: RunArgs) -> Result<()> {
    info!(
        "Apex daemon v{}.{}.{} starting.",
        env!("CARGO_PKG_VERSION_MAJOR"),
        env!("CARGO_PKG_VERSION_MINOR"),
        env!("CARGO_PKG_VERSION_PATCH"),
    );

    // Get the configuration, either from the file system or from the
    // command line arguments, as appropriate.
    let (config, reload_source) = if let Some(config_path) = run_args.config {
        info!("Loading the configuration from {}.", config_path.display());
        let config =
            config::load_from_path(&config_path).context("failed to load the configuration")?;
        (config, ReloadSource::Config(config_path))
    } else {
        info!("Loading the configuration from the command line.");
        let config =
            config::load_from_args(run_args).context("failed to load the configuration")?;
        let reload_source = ReloadSource::Args(config.clone());
        (config, reload_source)
    };

    // Bind before loading the zone, so that we fail fast if the
    // address is unavailable.
    let runtime = Runtime::new().context("failed to start the Tokio runtime")?;
    let io_provider = runtime
        .block_on(TokioIoProvider::bind([config.bind]))
        .context("failed to bind sockets")?;

    let resolver = load_resolver(&config)?;
    let server = Arc::new(Server::new(Arc::new(resolver)));

    // Set up signal handling.
    let mut signals = set_up_signal_handling().context("failed to set up signal handling")?;

    // Start the I/O provider.
    info!("Set-up is complete; starting the server.");
    let shutdown_controller = {
        let _guard = runtime.enter();
        io_provider.start(&server)
    };

    // Process incoming signals.
    for signal in signals.forever() {
        match signal {
            SIGINT => {
                info!("Received SIGINT; shutting down.");
                break;
            }
            SIGTERM => {
                info!("Received SIGTERM; shutting down.");
                break;
            }
            SIGHUP => {
                info!("Received SIGHUP; reloading the zone.");
                if let Err(e) = reload(&reload_source, &server) {
                    error!("{}", describe_error("Failed to reload the zone:", &e));
                }
            }
            _ => unreachable!(),
        }
    }

    // Shut down the server.
    runtime.block_on(shutdown_controller.shut_down());
    info!("Shutdown complete.");
    Ok(())
}

/// Loads the zone file named in `config`.
fn load_resolver(config: &Config) -> Result<AuthoritativeResolver> {
    info!("Loading the zone from {}.", config.zone.display());
    let resolver = AuthoritativeResolver::from_path(&config.zone, config.repr_options())
        .with_context(|| format!("failed to load the zone from {}", config.zone.display()))?;
    info!("Loaded {} records.", resolver.len());
    if config.print_records {
        resolver
            .print_records()
            .context("failed to print the records")?;
    }
    Ok(resolver)
}

fn set_up_signal_handling() -> Result<Signals> {
    let all_signals = &[SIGHUP, SIGINT, SIGTERM];
    let term_signals = &[SIGINT, SIGTERM];
    let already_terminating = Arc::new(AtomicBool::new(false));

    // This sets up signal handlers to exit immediately if a second
    // termination signal arrives before the process finishes shutting
    // down gracefully.
    for sig in term_signals {
        signal_hook::flag::register_conditional_shutdown(*sig, 1, already_terminating.clone())?;
        signal_hook::flag::register(*sig, already_terminating.clone())?;
    }

    Signals::new(all_signals).map_err(Into::into)
}

/// Where the configuration comes from when reloading.
enum ReloadSource {
    Args(Config),
    Config(PathBuf),
}

/// Reloads the zone and swaps it into the server. On failure, the
/// server keeps answering from the old zone.
fn reload(reload_source: &ReloadSource, server: &Server) -> Result<()> {
    let config = match reload_source {
        ReloadSource::Args(config) => config.clone(),
        ReloadSource::Config(path) => {
            config::load_from_path(path).context("failed to reload the configuration")?
        }
    };
    let resolver = load_resolver(&config)?;
    server.set_resolver(Arc::new(resolver));
    info!("Zone reloaded.");
    Ok(())
}

/// Formats an error and its chain of causes as `[i] cause` lines.
fn describe_error(heading: &str, e: &anyhow::Error) -> String {
    let mut message = String::from(heading);
    for (i, cause) in e.chain().enumerate() {
        let _ = write!(message, "\n[{}] {}", i + 1, cause);
    }
    message
}
