// Copyright 2021 Matthew Ingwersen.
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

//! Implementation of the [`Error`] type for name-related errors.

use std::fmt;

/// An error type used to report problems constructing, decoding, and
/// parsing names.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Error {
    /// An interior label of the name was empty (e.g. `a..b.`).
    EmptyLabel,

    /// The text to parse was empty. The root must be spelled `.`.
    EmptyName,

    /// Extra data was found after the name while parsing.
    ExtraData,

    /// A backslash escape was unterminated or out of range.
    InvalidEscape,

    /// A compression pointer referred to an offset that is not a valid
    /// target in the current message.
    InvalidPointer,

    /// A label was longer than 63 octets.
    LabelTooLong,

    /// The name had no trailing dot, so it is ambiguous whether it was
    /// meant to be fully qualified.
    MissingTrailingDot,

    /// The name is too long (longer than 255 octets on the wire).
    NameTooLong,

    /// An unquoted name contained a character that requires double
    /// quotes.
    NeedsQuotes,

    /// The last label was not the null label.
    NonNullTerminal,

    /// A null label was found in a non-terminal position.
    NullNonTerminal,

    /// The name had more than 255 labels.
    TooManyLabels,

    /// We unexpectedly encountered the end of the message (or the end
    /// of the text inside an unterminated double-quoted name).
    UnexpectedEom,

    /// A wire label used one of the reserved `01` or `10` label types.
    UnsupportedLabelType,
}

impl Error {
    /// Returns whether this error is about input that is well-formed
    /// but deliberately not accepted, rather than malformed.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::MissingTrailingDot | Self::UnsupportedLabelType)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::EmptyLabel => f.write_str("name contains an empty label"),
            Self::EmptyName => f.write_str("empty name is not allowed; did you mean \".\"?"),
            Self::ExtraData => f.write_str("extra data was present"),
            Self::InvalidEscape => f.write_str("invalid escape sequence"),
            Self::InvalidPointer => f.write_str("invalid compression pointer"),
            Self::LabelTooLong => f.write_str("label is longer than 63 octets"),
            Self::MissingTrailingDot => f.write_str("name without trailing dot is confusing"),
            Self::NameTooLong => f.write_str("name is longer than 255 octets on the wire"),
            Self::NeedsQuotes => f.write_str("unusual name requires double quotes"),
            Self::NonNullTerminal => f.write_str("last label is not null"),
            Self::NullNonTerminal => f.write_str("non-terminal label is null"),
            Self::TooManyLabels => f.write_str("name contains more than 255 labels"),
            Self::UnexpectedEom => f.write_str("unexpected end of input"),
            Self::UnsupportedLabelType => f.write_str("name uses an unsupported label type"),
        }
    }
}

impl std::error::Error for Error {}
