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

//! Implements the server configuration file.

use std::fs;
use std::net::{IpAddr, Ipv6Addr, SocketAddr};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use log::Level::Debug;
use log::{debug, log_enabled};
use serde::Deserialize;

use apex::name::ReprOptions;

use crate::args::RunArgs;

////////////////////////////////////////////////////////////////////////
// CONFIGURATION LOADING                                              //
////////////////////////////////////////////////////////////////////////

/// Loads the server configuration from the file given by `path`.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<Config> {
    let dir = match path.as_ref().parent() {
        Some(p) => p,
        None => return Err(anyhow!("the configuration file path has no parent")),
    };
    let raw_config =
        fs::read_to_string(path.as_ref()).context("failed to read the configuration file")?;
    let config = parse(&raw_config, dir)?;
    log_config_summary(&config);
    Ok(config)
}

/// Parses the text of a configuration file found in `dir`.
fn parse(raw_config: &str, dir: &Path) -> Result<Config> {
    let mut config: Config =
        toml::from_str(raw_config).context("failed to parse the configuration file")?;

    // The zone file path is interpreted relative to the configuration
    // file's directory.
    if config.zone.is_relative() {
        config.zone = dir.join(&config.zone);
    }
    Ok(config)
}

/// Loads the server configuration from the parsed command line
/// arguments given by `args`.
pub fn load_from_args(args: RunArgs) -> Result<Config> {
    let bind = args.bind.unwrap_or_else(|| {
        let ip = args.ip.unwrap_or(DEFAULT_BIND_IP);
        let port = args.port.unwrap_or(DEFAULT_BIND_PORT);
        SocketAddr::new(ip, port)
    });
    let zone = args
        .zone
        .ok_or_else(|| anyhow!("no zone file was given"))?;

    let config = Config {
        bind,
        zone,
        strict_fqdn: !args.allow_relative_names,
        print_records: args.print_records,
    };
    log_config_summary(&config);
    Ok(config)
}

/// Summarizes the configuration in the log, if the debug log level is
/// enabled.
fn log_config_summary(config: &Config) {
    if !log_enabled!(Debug) {
        // Don't compute the message if it will never be printed.
        return;
    }

    debug!(
        "Configuration loaded:\n\
         Bind address:   {}\n\
         Zone file:      {}\n\
         Strict FQDNs:   {}\n\
         Print records:  {}",
        config.bind,
        config.zone.display(),
        config.strict_fqdn,
        config.print_records,
    );
}

////////////////////////////////////////////////////////////////////////
// CONFIGURATION FILE STRUCTURE                                       //
////////////////////////////////////////////////////////////////////////

/// The complete configuration file.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,
    pub zone: PathBuf,
    #[serde(default = "default_strict_fqdn")]
    pub strict_fqdn: bool,
    #[serde(default)]
    pub print_records: bool,
}

impl Config {
    /// Returns the options to read the zone file with.
    pub fn repr_options(&self) -> ReprOptions {
        ReprOptions {
            require_trailing_dot: self.strict_fqdn,
        }
    }
}

const DEFAULT_BIND_IP: IpAddr = IpAddr::V6(Ipv6Addr::LOCALHOST);
const DEFAULT_BIND_PORT: u16 = 53;

fn default_bind() -> SocketAddr {
    SocketAddr::new(DEFAULT_BIND_IP, DEFAULT_BIND_PORT)
}

fn default_strict_fqdn() -> bool {
    true
}
