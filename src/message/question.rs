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

//! Implementation of the [`Question`] type.

use std::fmt;

use crate::bytes::{ByteReader, ByteWriter, Truncated};
use crate::class::Class;
use crate::name::{self, Name, SymbolTable};
use crate::rr::{Type, NAME_COLUMN_WIDTH};
use crate::util::{pad_to_tab_stop, pad_to_width};

////////////////////////////////////////////////////////////////////////
// QUESTIONS                                                          //
////////////////////////////////////////////////////////////////////////

/// The question of a DNS query.
///
/// Defined in [RFC 1035 § 4.1.2], a DNS question includes
///
/// * the QNAME, which is the domain name whose records are being
///   queried;
/// * the QTYPE, which specifies what types of records are desired
///   ([`Type::Any`] asks for all of them); and
/// * the QCLASS, which specifies which DNS class(es) to search.
///
/// While the original specification does not rule out having multiple
/// questions per message, in practice only one question per message is
/// used, and this server answers nothing else.
///
/// [RFC 1035 § 4.1.2]: https://datatracker.ietf.org/doc/html/rfc1035#section-4.1.2
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Question {
    pub qname: Name,
    pub qtype: Type,
    pub qclass: Class,
}

impl Question {
    /// Creates a question in class IN.
    pub fn new(qname: Name, qtype: Type) -> Self {
        Self {
            qname,
            qtype,
            qclass: Class::In,
        }
    }

    /// Decodes a question at the reader's position. On failure, the
    /// reader is left where it was.
    pub fn decode(reader: &mut ByteReader, symbols: &SymbolTable) -> Result<Self, name::Error> {
        let mut attempt = *reader;
        let qname = Name::decode(&mut attempt, symbols)?;
        let eom = |_| name::Error::UnexpectedEom;
        let qtype = Type::from(attempt.read_u16().map_err(eom)?);
        let qclass = Class::from(attempt.read_u16().map_err(eom)?);
        *reader = attempt;
        Ok(Self {
            qname,
            qtype,
            qclass,
        })
    }

    /// Encodes the question. Either all of it is written or nothing is.
    pub fn encode(&self, writer: &mut ByteWriter) -> Result<(), Truncated> {
        if writer.remaining() < self.wire_len() {
            return Err(Truncated);
        }
        self.qname.encode(writer)?;
        writer.write_u16(self.qtype.into())?;
        writer.write_u16(self.qclass.into())
    }

    /// Returns the length of the question on the wire.
    pub fn wire_len(&self) -> usize {
        self.qname.wire_len() + 4
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut text = self.qname.repr();
        pad_to_width(&mut text, NAME_COLUMN_WIDTH);
        pad_to_tab_stop(&mut text);
        f.write_str(&text)?;
        write!(f, "{} {}", self.qclass, self.qtype)
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
