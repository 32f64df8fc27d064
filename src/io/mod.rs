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

//! I/O providers for running [`Server`s](crate::server::Server).
//!
//! The [`Server`](crate::server::Server) structure implements the
//! processing logic of an authoritative DNS server abstracted from
//! network I/O. An I/O provider receives datagrams from the operating
//! system, hands them to the [`Server`](crate::server::Server), and
//! sends back whatever it produces.

mod tokio;

pub use self::tokio::{TokioIoProvider, TokioShutdownController};
