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

//! A tiny `dig`: sends one query to a server and prints the reply.

use std::fmt::Write;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::process;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;

use apex::message::{Message, Question};
use apex::name::Name;
use apex::rr::Type;
use apex::stub::StubResolver;

/// Query a DNS server and print the response
#[derive(Debug, Parser)]
#[command(author, version)]
struct Args {
    /// The UDP port of the server
    #[arg(value_parser = clap::value_parser!(u16).range(1..))]
    port: u16,

    /// The domain name to query
    qname: Name,

    /// The RR type to query
    qtype: Type,

    /// The IP address of the server
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST), value_name = "IP")]
    server: IpAddr,

    /// How long to wait for a response, in milliseconds
    #[arg(long, default_value_t = 1000, value_name = "MS")]
    timeout: u64,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::init_from_env(Env::new().default_filter_or("warn"));
    let args = Args::parse();

    match dig(args).await {
        Ok(response) => print!("{}", response),
        Err(e) => {
            let mut message = String::from("Failed to query:");
            for (i, cause) in e.chain().enumerate() {
                let _ = write!(message, "\n[{}] {}", i + 1, cause);
            }
            eprintln!("{}", message);
            process::exit(1);
        }
    }
}

async fn dig(args: Args) -> Result<Message> {
    let mut query = Message::begin_query(Question::new(args.qname, args.qtype));
    query.set_rd(true);

    let resolver = StubResolver::new(SocketAddr::new(args.server, args.port))
        .with_timeout(Duration::from_millis(args.timeout));
    resolver
        .resolve(&query)
        .await
        .with_context(|| format!("no usable response from {}", resolver.upstream()))
}
