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

//! Provides the [`Type`] enumeration for DNS RR types.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::util::Caseless;

////////////////////////////////////////////////////////////////////////
// RR TYPES                                                           //
////////////////////////////////////////////////////////////////////////

/// Represents the RR type of a DNS record (or the QTYPE of a question).
///
/// An RR type is an unsigned 16-bit integer on the wire. The types this
/// server interprets have their own variants, and
/// [`Other`](Type::Other) carries everything else so that records of
/// any type can still be decoded and relayed. As with
/// [`Class`](crate::class::Class), conversion from [`u16`] picks the
/// named variant where there is one, and equality goes through the
/// numeric value.
#[derive(Clone, Copy)]
pub enum Type {
    A,
    Ns,
    Cname,
    Soa,
    Ptr,
    Mx,
    Txt,
    Any,
    Other(u16),
}

impl From<u16> for Type {
    fn from(value: u16) -> Self {
        match value {
            1 => Self::A,
            2 => Self::Ns,
            5 => Self::Cname,
            6 => Self::Soa,
            12 => Self::Ptr,
            15 => Self::Mx,
            16 => Self::Txt,
            255 => Self::Any,
            _ => Self::Other(value),
        }
    }
}

impl From<Type> for u16 {
    fn from(rr_type: Type) -> Self {
        match rr_type {
            Type::A => 1,
            Type::Ns => 2,
            Type::Cname => 5,
            Type::Soa => 6,
            Type::Ptr => 12,
            Type::Mx => 15,
            Type::Txt => 16,
            Type::Any => 255,
            Type::Other(value) => value,
        }
    }
}

impl Type {
    /// Returns the mnemonic of the type, if it has one.
    pub fn mnemonic(self) -> Option<&'static str> {
        match Self::from(u16::from(self)) {
            Self::A => Some("A"),
            Self::Ns => Some("NS"),
            Self::Cname => Some("CNAME"),
            Self::Soa => Some("SOA"),
            Self::Ptr => Some("PTR"),
            Self::Mx => Some("MX"),
            Self::Txt => Some("TXT"),
            Self::Any => Some("ANY"),
            Self::Other(_) => None,
        }
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        u16::from(*self) == u16::from(*other)
    }
}

impl Eq for Type {}

impl Hash for Type {
    fn hash<H: Hasher>(&self, state: &mut H) {
        u16::from(*self).hash(state)
    }
}

impl FromStr for Type {
    type Err = &'static str;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mnemonic = [
            ("A", Self::A),
            ("NS", Self::Ns),
            ("CNAME", Self::Cname),
            ("SOA", Self::Soa),
            ("PTR", Self::Ptr),
            ("MX", Self::Mx),
            ("TXT", Self::Txt),
            ("ANY", Self::Any),
            ("*", Self::Any),
        ]
        .into_iter()
        .find(|&(mnemonic, _)| Caseless(mnemonic) == Caseless(text));
        if let Some((_, rr_type)) = mnemonic {
            Ok(rr_type)
        } else if text
            .get(0..4)
            .map_or(false, |prefix| prefix.eq_ignore_ascii_case("TYPE"))
        {
            text[4..]
                .parse::<u16>()
                .map(Self::from)
                .or(Err("type value is not a valid unsigned 16-bit integer"))
        } else {
            Err("unknown type")
        }
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.mnemonic() {
            Some(mnemonic) => f.write_str(mnemonic),
            None => write!(f, "TYPE{}", u16::from(*self)), // RFC 3597 § 5
        }
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
