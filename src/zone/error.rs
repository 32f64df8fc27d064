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

//! Implementation of the [`Error`] type for zone loading.

use std::fmt;
use std::io;

use crate::rr::TextError;

/// Errors that arise while loading a zone file into an
/// [`AuthoritativeResolver`](super::AuthoritativeResolver).
#[derive(Debug)]
pub enum Error {
    /// The zone file could not be read.
    Io(io::Error),

    /// A line of the zone file could not be parsed. Lines are numbered
    /// from 1.
    Line { line: usize, error: TextError },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Io(_) => f.write_str("failed to read the zone file"),
            Self::Line { line, error } => write!(f, "line {}: {}", line, error),
        }
    }
}

impl From<io::Error> for Error {
    fn from(error: io::Error) -> Self {
        Self::Io(error)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(error) => Some(error),
            Self::Line { error, .. } => Some(error),
        }
    }
}
