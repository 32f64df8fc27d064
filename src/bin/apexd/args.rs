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

//! Implements command-line argument parsing.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use clap::{ArgGroup, Parser, Subcommand};

/// Parses the command line arguments.
pub fn parse() -> Args {
    Args::parse()
}

/// The Apex authoritative DNS server
#[derive(Debug, Parser)]
#[command(author, version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the server
    Run(RunArgs),
}

#[derive(Debug, Parser)]
#[command(group(ArgGroup::new("required").required(true).args(["config", "zone"])))]
pub struct RunArgs {
    /// Set the configuration file to use
    #[arg(
        long,
        conflicts_with_all = ["bind", "ip", "port", "zone", "allow_relative_names", "print_records"],
        value_name = "FILE"
    )]
    pub config: Option<PathBuf>,

    /// Set the server bind IP address and port
    #[arg(long, value_name = "IP:PORT")]
    pub bind: Option<SocketAddr>,

    /// Set the server bind IP address
    #[arg(long, conflicts_with = "bind", value_name = "IP")]
    pub ip: Option<IpAddr>,

    /// Set the server port
    #[arg(long, conflicts_with = "bind", value_name = "PORT")]
    pub port: Option<u16>,

    /// Set the zone file to serve
    #[arg(long, value_name = "FILE")]
    pub zone: Option<PathBuf>,

    /// Accept zone-file names without a trailing dot
    #[arg(long)]
    pub allow_relative_names: bool,

    /// Print the loaded records at startup
    #[arg(long)]
    pub print_records: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn try_parse(args: &[&str]) -> Result<RunArgs, clap::Error> {
        Args::try_parse_from(args).map(|args| match args.command {
            Command::Run(run_args) => run_args,
        })
    }

    #[test]
    fn quick_start_flags_are_accepted() {
        let run_args = try_parse(&["apexd", "run", "--zone", "zone.txt", "--port", "5300"]).unwrap();
        assert_eq!(run_args.zone, Some(PathBuf::from("zone.txt")));
        assert_eq!(run_args.port, Some(5300));
        assert!(!run_args.allow_relative_names);
    }

    #[test]
    fn config_conflicts_with_quick_start_flags() {
        assert!(try_parse(&["apexd", "run", "--config", "apex.toml"]).is_ok());
        assert!(try_parse(&["apexd", "run", "--config", "apex.toml", "--zone", "z"]).is_err());
        assert!(try_parse(&["apexd", "run", "--config", "apex.toml", "--port", "53"]).is_err());
        assert!(try_parse(&["apexd", "run", "--zone", "z", "--bind", "[::1]:53", "--ip", "::1"]).is_err());
    }

    #[test]
    fn a_zone_or_config_is_required() {
        assert!(try_parse(&["apexd", "run"]).is_err());
        assert!(try_parse(&["apexd", "run", "--port", "53"]).is_err());
    }
}
