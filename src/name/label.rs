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

//! Implementation of the [`Label`] and [`LabelBuf`] types.

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;

use arrayvec::ArrayVec;

use super::{Error, MAX_LABEL_LEN};

////////////////////////////////////////////////////////////////////////
// LABELS                                                             //
////////////////////////////////////////////////////////////////////////

/// The label given to a node in the Domain Name System's tree
/// structure.
///
/// `Label` is a wrapper over `[u8]` that can only be constructed if the
/// slice is a valid DNS label (that is, if it is no more than 63 octets
/// long). In accordance with [RFC 1034 § 3.1], comparisons between
/// `Label`s are ASCII-case-insensitive, but case is preserved in the
/// internal representation.
///
/// ```
/// use apex::name::Label;
///
/// let label = Label::new(b"Example").unwrap();
/// assert_eq!(label, Label::new(b"eXAMPLE").unwrap());
/// ```
///
/// [RFC 1034 § 3.1]: https://tools.ietf.org/html/rfc1034#section-3.1
#[repr(transparent)]
pub struct Label {
    octets: [u8],
}

#[allow(clippy::len_without_is_empty)] // Following DNS terminology, we have is_null().
impl Label {
    /// Wraps `octets` as a `Label`, failing if it is longer than 63
    /// octets.
    pub fn new(octets: &[u8]) -> Result<&Self, Error> {
        if octets.len() > MAX_LABEL_LEN {
            Err(Error::LabelTooLong)
        } else {
            Ok(Self::from_unchecked(octets))
        }
    }

    /// Returns the asterisk label `*`, which marks a wildcard domain
    /// name.
    pub fn asterisk() -> &'static Self {
        static ASTERISK_LABEL: &[u8; 1] = b"*";
        Self::from_unchecked(ASTERISK_LABEL)
    }

    /// Returns the null (zero-length) `Label` that terminates every
    /// fully qualified name.
    pub fn null() -> &'static Self {
        Self::from_unchecked(&[])
    }

    /// Wraps up a `&[u8]` as a `Label` without checking its length.
    /// Callers must have checked the length already.
    fn from_unchecked(octets: &[u8]) -> &Self {
        // SAFETY: Label is a repr(transparent) wrapper around [u8].
        unsafe { &*(octets as *const [u8] as *const Label) }
    }

    /// Returns whether this `Label` is the asterisk label.
    pub fn is_asterisk(&self) -> bool {
        self.octets == *b"*"
    }

    /// Returns whether this `Label` is the null (zero-length) label.
    pub fn is_null(&self) -> bool {
        self.octets.is_empty()
    }

    /// Returns the number of octets in this `Label`.
    pub fn len(&self) -> usize {
        self.octets.len()
    }

    /// Returns the octets of this `Label`.
    pub fn octets(&self) -> &[u8] {
        &self.octets
    }
}

impl ToOwned for Label {
    type Owned = LabelBuf;

    fn to_owned(&self) -> Self::Owned {
        LabelBuf::from_unchecked(self.octets())
    }
}

/// When a `Label` is displayed, it is escaped for the zone-file text
/// form:
///
/// * periods, backslashes, and double quotes are escaped as `\.`,
///   `\\`, and `\"`;
/// * octets outside of printable ASCII are escaped `\DDD`, where `DDD`
///   is the three-digit zero-padded decimal value of the octet; and
/// * everything else (including spaces) is written as is.
impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for octet in self.octets() {
            match *octet {
                b'.' => f.write_str("\\.")?,
                b'\\' => f.write_str("\\\\")?,
                b'"' => f.write_str("\\\"")?,
                0x20..=0x7e => write!(f, "{}", *octet as char)?,
                _ => write!(f, "\\{:03}", *octet)?,
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Label {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "\"{}\"", self)
    }
}

impl PartialEq for Label {
    fn eq(&self, other: &Self) -> bool {
        self.octets().eq_ignore_ascii_case(other.octets())
    }
}

impl Eq for Label {}

impl PartialOrd for Label {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// `Label`s are ordered as unsigned left-justified octet strings, with
/// uppercase ASCII letters treated as if they were lowercase (the
/// canonical ordering of [RFC 4034 § 6.1]).
///
/// [RFC 4034 § 6.1]: https://datatracker.ietf.org/doc/html/rfc4034#section-6.1
impl Ord for Label {
    fn cmp(&self, other: &Self) -> Ordering {
        let lowercase = |octet: &u8| octet.to_ascii_lowercase();
        self.octets
            .iter()
            .map(lowercase)
            .cmp(other.octets.iter().map(lowercase))
    }
}

impl Hash for Label {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Hashing must be case-insensitive to agree with Eq.
        state.write_usize(self.octets.len());
        for octet in self.octets() {
            state.write_u8(octet.to_ascii_lowercase());
        }
    }
}

////////////////////////////////////////////////////////////////////////
// LABEL BUFFERS                                                      //
////////////////////////////////////////////////////////////////////////

/// An owned buffer capable of holding any valid DNS label. It
/// dereferences to a [`Label`], and compares and hashes exactly as the
/// [`Label`] does, so `LabelBuf`s can key a map that is probed with
/// `&Label`s.
#[derive(Clone, Default)]
pub struct LabelBuf {
    octets: ArrayVec<u8, MAX_LABEL_LEN>,
}

impl LabelBuf {
    /// Returns an owned copy of the null label.
    pub fn null() -> Self {
        Self::default()
    }

    /// Copies `octets` into a new `LabelBuf`. The length must already
    /// have been checked.
    fn from_unchecked(octets: &[u8]) -> Self {
        let mut buf = ArrayVec::new();
        buf.try_extend_from_slice(&octets[..octets.len().min(MAX_LABEL_LEN)])
            .ok();
        Self { octets: buf }
    }
}

impl TryFrom<&[u8]> for LabelBuf {
    type Error = Error;

    fn try_from(octets: &[u8]) -> Result<Self, Self::Error> {
        Label::new(octets).map(ToOwned::to_owned)
    }
}

impl From<ArrayVec<u8, MAX_LABEL_LEN>> for LabelBuf {
    fn from(octets: ArrayVec<u8, MAX_LABEL_LEN>) -> Self {
        Self { octets }
    }
}

impl From<&Label> for LabelBuf {
    fn from(label: &Label) -> Self {
        label.to_owned()
    }
}

impl Deref for LabelBuf {
    type Target = Label;

    fn deref(&self) -> &Self::Target {
        Label::from_unchecked(&self.octets)
    }
}

impl Borrow<Label> for LabelBuf {
    fn borrow(&self) -> &Label {
        self.deref()
    }
}

impl fmt::Display for LabelBuf {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.deref().fmt(f)
    }
}

impl fmt::Debug for LabelBuf {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self.deref(), f)
    }
}

// For use in HashMaps, Eq and Hash must be the same as for the
// corresponding Label.
impl PartialEq for LabelBuf {
    fn eq(&self, other: &Self) -> bool {
        self.deref() == other.deref()
    }
}

impl Eq for LabelBuf {}

impl PartialOrd for LabelBuf {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LabelBuf {
    fn cmp(&self, other: &Self) -> Ordering {
        self.deref().cmp(other.deref())
    }
}

impl Hash for LabelBuf {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.deref().hash(state)
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
