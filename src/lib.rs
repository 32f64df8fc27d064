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

//! Apex is a small authoritative DNS server.
//!
//! The library is layered from the wire up. [`bytes`] provides bounded
//! big-endian readers and writers; [`name`], [`class`] and [`rr`]
//! implement domain names and resource records in both their wire and
//! zone-file text forms; and [`message`] assembles them into whole DNS
//! messages. The [`zone`] module holds the domain tree and the
//! [`AuthoritativeResolver`](zone::AuthoritativeResolver) that answers
//! questions from it, while [`server`] applies the per-message policy
//! of an authoritative server.
//!
//! With the `tokio` feature, [`io`] runs a [`Server`](server::Server)
//! over UDP and [`stub`] provides the small client used by `apex-dig`.

pub mod bytes;
pub mod class;
#[cfg(feature = "tokio")]
pub mod io;
pub mod message;
pub mod name;
pub mod rr;
pub mod server;
#[cfg(feature = "tokio")]
pub mod stub;
mod util;
pub mod zone;
