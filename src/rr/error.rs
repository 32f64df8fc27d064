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

//! Errors for the text (zone-file) form of records.

use std::fmt;

use super::Type;
use crate::name;

/// The two broad kinds of text errors.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ErrorKind {
    /// The text is syntactically invalid.
    Malformed,

    /// The text is valid, but this implementation declines to
    /// interpret it.
    Unsupported,
}

/// An error produced while parsing or rendering the text form of a
/// record.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TextError {
    /// The line did not have the name, TTL, class, type and RDATA
    /// fields.
    WrongFormat,

    /// The TTL was not an integer in `1..=999999999`.
    TtlOutOfRange,

    /// The class was something other than `IN`.
    UnsupportedClass,

    /// The type mnemonic was not recognized.
    UnknownType,

    /// The type is recognized, but has no text form here.
    UnsupportedType(Type),

    /// The type is known, but its text form is deliberately not
    /// implemented.
    KnownButUnsupported(Type),

    /// The RDATA text did not have the form required by its type.
    BadRdata(Type, &'static str),

    /// Binary RDATA could not be interpreted as its type.
    InvalidWireRdata(Type),

    /// A name in the record was invalid.
    Name(name::Error),
}

impl TextError {
    /// Returns the broad kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedClass
            | Self::UnknownType
            | Self::UnsupportedType(_)
            | Self::KnownButUnsupported(_) => ErrorKind::Unsupported,
            Self::Name(error) if error.is_unsupported() => ErrorKind::Unsupported,
            _ => ErrorKind::Malformed,
        }
    }
}

impl From<name::Error> for TextError {
    fn from(error: name::Error) -> Self {
        Self::Name(error)
    }
}

impl fmt::Display for TextError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::WrongFormat => f.write_str("record has the wrong format"),
            Self::TtlOutOfRange => f.write_str("record has an out-of-range TTL"),
            Self::UnsupportedClass => f.write_str("record has a class other than IN"),
            Self::UnknownType => f.write_str("record has an unrecognized type"),
            Self::UnsupportedType(rr_type) => write!(f, "record has unsupported type {}", rr_type),
            Self::KnownButUnsupported(rr_type) => {
                write!(f, "text form of {} records is known but unsupported", rr_type)
            }
            Self::BadRdata(rr_type, reason) => write!(f, "{} record {}", rr_type, reason),
            Self::InvalidWireRdata(rr_type) => write!(f, "{} record has invalid RDATA", rr_type),
            Self::Name(error) => write!(f, "bad name: {}", error),
        }
    }
}

impl std::error::Error for TextError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Name(error) => Some(error),
            _ => None,
        }
    }
}
