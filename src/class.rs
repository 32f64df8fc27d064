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

//! Implementation of the [`Class`] type for DNS classes.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::util::Caseless;

/// Represents a class (or QCLASS) in the DNS.
///
/// A class is an unsigned 16-bit integer on the wire. The classes
/// defined by RFC 1035 have their own variants; every other value is
/// carried by [`Other`](Class::Other). Conversion from [`u16`] always
/// picks the named variant when there is one, and equality and hashing
/// go through the numeric value, so `Class::Other(1) == Class::In`.
#[derive(Clone, Copy)]
pub enum Class {
    In,
    Cs,
    Ch,
    Hs,
    Any,
    Other(u16),
}

impl From<u16> for Class {
    fn from(value: u16) -> Self {
        match value {
            1 => Self::In,
            2 => Self::Cs,
            3 => Self::Ch,
            4 => Self::Hs,
            255 => Self::Any,
            _ => Self::Other(value),
        }
    }
}

impl From<Class> for u16 {
    fn from(class: Class) -> Self {
        match class {
            Class::In => 1,
            Class::Cs => 2,
            Class::Ch => 3,
            Class::Hs => 4,
            Class::Any => 255,
            Class::Other(value) => value,
        }
    }
}

impl PartialEq for Class {
    fn eq(&self, other: &Self) -> bool {
        u16::from(*self) == u16::from(*other)
    }
}

impl Eq for Class {}

impl Hash for Class {
    fn hash<H: Hasher>(&self, state: &mut H) {
        u16::from(*self).hash(state)
    }
}

impl FromStr for Class {
    type Err = &'static str;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mnemonic = [
            ("IN", Self::In),
            ("CS", Self::Cs),
            ("CH", Self::Ch),
            ("HS", Self::Hs),
            ("ANY", Self::Any),
        ]
        .into_iter()
        .find(|&(mnemonic, _)| Caseless(mnemonic) == Caseless(text));
        if let Some((_, class)) = mnemonic {
            Ok(class)
        } else if text
            .get(0..5)
            .map_or(false, |prefix| prefix.eq_ignore_ascii_case("CLASS"))
        {
            text[5..]
                .parse::<u16>()
                .map(Self::from)
                .or(Err("class value is not a valid unsigned 16-bit integer"))
        } else {
            Err("unknown class")
        }
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", *self)
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match Self::from(u16::from(*self)) {
            Self::In => f.write_str("IN"),
            Self::Cs => f.write_str("CS"),
            Self::Ch => f.write_str("CH"),
            Self::Hs => f.write_str("HS"),
            Self::Any => f.write_str("ANY"),
            Self::Other(value) => write!(f, "CLASS{}", value), // RFC 3597 § 5
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Class;

    #[test]
    fn displays_according_to_rfc3597() {
        // CLASS65280 is from the private use range, so it should always
        // be unknown.
        let class = Class::from(0xff00);
        assert_eq!(class.to_string(), "CLASS65280");
        assert_eq!(Class::Other(3).to_string(), "CH");
    }

    #[test]
    fn parses_according_to_rfc3597() {
        let class_in: Class = "CLASS1".parse().unwrap();
        let class_65280: Class = "CLASS65280".parse().unwrap();
        assert_eq!(class_in, Class::In);
        assert!(matches!(class_in, Class::In));
        assert_eq!(u16::from(class_65280), 65280);
        assert!("CLASS".parse::<Class>().is_err());
        assert!("bogus".parse::<Class>().is_err());
    }

    #[test]
    fn equality_goes_through_the_numeric_value() {
        assert_eq!(Class::Other(1), Class::In);
        assert_ne!(Class::Other(2), Class::In);
        assert_eq!("in".parse::<Class>().unwrap(), Class::In);
    }

    #[test]
    fn mnemonics_are_case_insensitive() {
        for text in ["IN", "in", "In", "iN"] {
            assert_eq!(text.parse::<Class>().unwrap(), Class::In);
        }
        assert!(matches!("Ch".parse::<Class>().unwrap(), Class::Ch));
        assert!(matches!("any".parse::<Class>().unwrap(), Class::Any));
        assert_eq!(u16::from("class3".parse::<Class>().unwrap()), 3);
        assert!("INN".parse::<Class>().is_err());
    }
}
