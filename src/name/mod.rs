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

//! Implementation of data structures related to domain names.
//!
//! A [`Name`] has two encodings. The wire encoding (the `wire` module)
//! is the length-prefixed label format of [RFC 1035 § 3.1], decoded
//! with the help of a per-message [`SymbolTable`] so that compression
//! pointers can be followed. The text encoding (the `text` module) is
//! the zone-file presentation format.
//!
//! [RFC 1035 § 3.1]: https://datatracker.ietf.org/doc/html/rfc1035#section-3.1

use std::fmt;
use std::ops::Index;
use std::str::FromStr;

mod error;
mod label;
mod symbols;
mod text;
mod wire;
pub use error::Error;
pub use label::{Label, LabelBuf};
pub use symbols::SymbolTable;
pub use text::ReprOptions;

/// The maximum number of labels accepted in the text form of a name.
const MAX_N_LABELS: usize = 255;

/// The maximum length of the uncompressed on-the-wire representation of
/// a domain name.
const MAX_WIRE_LEN: usize = 255;

/// The maximum length of a label in a domain name (not including the
/// octet that provides the length).
const MAX_LABEL_LEN: usize = 63;

////////////////////////////////////////////////////////////////////////
// NAME STRUCTURE                                                     //
////////////////////////////////////////////////////////////////////////

/// A fully qualified domain name.
///
/// A `Name` is an ordered sequence of [`Label`]s that always ends with
/// exactly one null label (the root). No other label is null, no label
/// exceeds 63 octets, and the wire form is at most 255 octets. Every
/// constructor enforces these invariants.
///
/// Comparison and hashing are ASCII-case-insensitive, label by label,
/// while the original case is preserved for display.
///
/// ```
/// use apex::name::Name;
///
/// let a: Name = "Foo.Example.".parse().unwrap();
/// let b: Name = "foo.EXAMPLE.".parse().unwrap();
/// assert_eq!(a, b);
/// assert_eq!(a.to_string(), "Foo.Example.");
/// ```
#[derive(Clone, Eq, Hash, PartialEq)]
pub struct Name {
    labels: Vec<LabelBuf>,
}

impl Name {
    /// Returns the root name `.`.
    pub fn root() -> Self {
        Self {
            labels: vec![LabelBuf::null()],
        }
    }

    /// Builds a `Name` from its labels, which must include the
    /// terminating null label.
    pub fn from_labels<I, L>(labels: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = L>,
        L: AsRef<[u8]>,
    {
        let labels = labels
            .into_iter()
            .map(|label| LabelBuf::try_from(label.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        match labels.last() {
            None => return Err(Error::NonNullTerminal),
            Some(last) if !last.is_null() => return Err(Error::NonNullTerminal),
            Some(_) => (),
        }
        if labels[..labels.len() - 1].iter().any(|label| label.is_null()) {
            return Err(Error::NullNonTerminal);
        }
        Self::from_label_bufs(labels)
    }

    /// Wraps already-validated labels, checking only the total length.
    /// The caller guarantees the null-label invariants.
    fn from_label_bufs(labels: Vec<LabelBuf>) -> Result<Self, Error> {
        let name = Self { labels };
        if name.wire_len() > MAX_WIRE_LEN {
            Err(Error::NameTooLong)
        } else {
            Ok(name)
        }
    }

    /// Returns whether this is the root name.
    pub fn is_root(&self) -> bool {
        self.labels.len() == 1
    }

    /// Returns whether this is a wildcard domain name, i.e. whether its
    /// first label is `*`.
    pub fn is_wildcard(&self) -> bool {
        self.labels[0].is_asterisk()
    }

    /// Returns the labels of the name, including the terminating null
    /// label.
    pub fn labels(&self) -> &[LabelBuf] {
        &self.labels
    }

    /// Iterates over the non-null labels starting from the top of the
    /// DNS tree, i.e. `com`, `example`, `www` for `www.example.com.`.
    /// This is the order in which a name is looked up in a tree.
    pub fn labels_from_root(&self) -> impl DoubleEndedIterator<Item = &Label> {
        self.labels[..self.labels.len() - 1]
            .iter()
            .rev()
            .map(|label| &**label)
    }

    /// Returns the number of labels in the name, including the null
    /// label. The root name thus has length 1.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Returns the length of the uncompressed wire form of the name.
    pub fn wire_len(&self) -> usize {
        self.labels.iter().map(|label| label.len() + 1).sum()
    }
}

impl Index<usize> for Name {
    type Output = Label;

    fn index(&self, index: usize) -> &Self::Output {
        &self.labels[index]
    }
}

impl FromStr for Name {
    type Err = Error;

    /// Parses the text form of a name, requiring that the whole string
    /// be consumed.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let (name, rest) = Self::decode_repr(text)?;
        if rest.is_empty() {
            Ok(name)
        } else {
            Err(Error::ExtraData)
        }
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.repr())
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Name({})", self.repr())
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
