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

//! Resource records and their wire and text (zone-file) forms.

use std::fmt;
use std::str::FromStr;

use crate::bytes::{ByteReader, ByteWriter, Truncated};
use crate::class::Class;
use crate::name::{self, Name, ReprOptions, SymbolTable};
use crate::util::{pad_to_tab_stop, pad_to_width};

mod error;
mod rdata;
mod rr_type;
pub use error::{ErrorKind, TextError};
pub use rdata::to_generic_text;
pub use rr_type::Type;

/// The largest TTL accepted in the text form of a record.
pub const MAX_TEXT_TTL: u32 = 999_999_999;

/// The width of the owner name column in the text form of records and
/// questions.
pub const NAME_COLUMN_WIDTH: usize = 32;

////////////////////////////////////////////////////////////////////////
// RESOURCE RECORDS                                                   //
////////////////////////////////////////////////////////////////////////

/// A DNS resource record.
///
/// The RDATA is kept as uncompressed wire octets. It is interpreted
/// only to produce or parse the text form, so records of any type can
/// be decoded from a message and encoded again unchanged.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct ResourceRecord {
    name: Name,
    rr_type: Type,
    class: Class,
    ttl: u32,
    rdata: Vec<u8>,
}

impl ResourceRecord {
    pub fn new(name: Name, rr_type: Type, class: Class, ttl: u32, rdata: Vec<u8>) -> Self {
        Self {
            name,
            rr_type,
            class,
            ttl,
            rdata,
        }
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn rr_type(&self) -> Type {
        self.rr_type
    }

    pub fn class(&self) -> Class {
        self.class
    }

    pub fn ttl(&self) -> u32 {
        self.ttl
    }

    pub fn rdata(&self) -> &[u8] {
        &self.rdata
    }

    /// Returns a copy of this record with its owner name replaced. This
    /// is how records matched through a wildcard are synthesized (RFC
    /// 1034 § 4.3.3); the original record is not touched.
    pub fn with_name(&self, name: Name) -> Self {
        Self {
            name,
            rdata: self.rdata.clone(),
            ..*self
        }
    }

    /// Returns the length of the record on the wire, without
    /// compression.
    pub fn wire_len(&self) -> usize {
        self.name.wire_len() + 10 + self.rdata.len()
    }
}

////////////////////////////////////////////////////////////////////////
// WIRE FORM                                                          //
////////////////////////////////////////////////////////////////////////

impl ResourceRecord {
    /// Decodes a record at the reader's position. Names embedded in the
    /// RDATA of RFC 1035 types are decompressed; any other RDATA is
    /// copied as it is. On failure, the reader is left where it was.
    pub fn decode(reader: &mut ByteReader, symbols: &SymbolTable) -> Result<Self, name::Error> {
        let mut attempt = *reader;
        let name = Name::decode(&mut attempt, symbols)?;
        let eom = |_| name::Error::UnexpectedEom;
        let rr_type = Type::from(attempt.read_u16().map_err(eom)?);
        let class = Class::from(attempt.read_u16().map_err(eom)?);
        let ttl = attempt.read_u32().map_err(eom)?;
        let rdlength = attempt.read_u16().map_err(eom)? as usize;
        let start = attempt.position();
        attempt.read_octets(rdlength).map_err(eom)?;
        let rdata_reader = ByteReader::at(&attempt.buffer()[..start + rdlength], start);
        let rdata = rdata::read_rdata(rr_type, rdata_reader, symbols);
        *reader = attempt;
        Ok(Self::new(name, rr_type, class, ttl, rdata))
    }

    /// Encodes the record without compression. Either the whole record
    /// is written or nothing is.
    pub fn encode(&self, writer: &mut ByteWriter) -> Result<(), Truncated> {
        let rdlength = u16::try_from(self.rdata.len()).map_err(|_| Truncated)?;
        if writer.remaining() < self.wire_len() {
            return Err(Truncated);
        }
        self.name.encode(writer)?;
        writer.write_u16(self.rr_type.into())?;
        writer.write_u16(self.class.into())?;
        writer.write_u32(self.ttl)?;
        writer.write_u16(rdlength)?;
        writer.write_octets(&self.rdata)
    }
}

////////////////////////////////////////////////////////////////////////
// TEXT FORM                                                          //
////////////////////////////////////////////////////////////////////////

impl ResourceRecord {
    /// Parses one zone-file line of the form
    /// `<name> <ttl> IN <type> <rdata>` with the default [`ReprOptions`].
    pub fn decode_repr(text: &str) -> Result<Self, TextError> {
        Self::decode_repr_with(text, ReprOptions::default())
    }

    /// Like [`ResourceRecord::decode_repr`], but with explicit options
    /// for the names in the record.
    pub fn decode_repr_with(text: &str, options: ReprOptions) -> Result<Self, TextError> {
        let (name, rest) = Name::decode_repr_with(text.trim_start(), options)?;
        let (ttl, rest) = rdata::next_field(rest).ok_or(TextError::WrongFormat)?;
        let (class, rest) = rdata::next_field(rest).ok_or(TextError::WrongFormat)?;
        let (rr_type, rest) = rdata::next_field(rest).ok_or(TextError::WrongFormat)?;
        let rdata_text = rest.trim();
        if rdata_text.is_empty() || !ttl.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TextError::WrongFormat);
        }

        let ttl = ttl
            .parse::<u32>()
            .ok()
            .filter(|ttl| (1..=MAX_TEXT_TTL).contains(ttl))
            .ok_or(TextError::TtlOutOfRange)?;
        match class.parse::<Class>() {
            Ok(Class::In) => (),
            _ => return Err(TextError::UnsupportedClass),
        }
        let rr_type: Type = rr_type.parse().map_err(|_| TextError::UnknownType)?;
        let rdata = rdata::from_text(rr_type, rdata_text, options)?;
        Ok(Self::new(name, rr_type, Class::In, ttl, rdata))
    }

    /// Produces the zone-file text form of the record. This fails for
    /// types that have no text form and for RDATA that is not valid for
    /// its type; the [`Display`](fmt::Display) implementation falls
    /// back to the RFC 3597 generic form in those cases.
    pub fn repr(&self) -> Result<String, TextError> {
        rdata::to_text(self.rr_type, &self.rdata).map(|rdata| self.columns(&rdata))
    }

    /// Lays out the owner name, TTL, class and type in columns, followed
    /// by `rdata`.
    fn columns(&self, rdata: &str) -> String {
        let mut text = self.name.repr();
        pad_to_width(&mut text, NAME_COLUMN_WIDTH);
        pad_to_tab_stop(&mut text);
        text.push_str(&self.ttl.to_string());
        pad_to_tab_stop(&mut text);
        text.push_str(&format!("{} {}", self.class, self.rr_type));
        pad_to_tab_stop(&mut text);
        text.push_str(rdata);
        text
    }
}

impl FromStr for ResourceRecord {
    type Err = TextError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Self::decode_repr(text)
    }
}

impl fmt::Display for ResourceRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let rdata = rdata::to_text(self.rr_type, &self.rdata)
            .unwrap_or_else(|_| to_generic_text(&self.rdata));
        f.write_str(&self.columns(&rdata))
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_zone_file_lines() {
        let rr: ResourceRecord = "  www.example.   3600 IN A 192.0.2.1  ".parse().unwrap();
        assert_eq!(rr.name(), &"www.example.".parse().unwrap());
        assert_eq!(rr.rr_type(), Type::A);
        assert_eq!(rr.class(), Class::In);
        assert_eq!(rr.ttl(), 3600);
        assert_eq!(rr.rdata(), [192, 0, 2, 1]);
    }

    #[test]
    fn rejects_out_of_range_ttls() {
        for line in [
            "a. 0 IN A 192.0.2.1",
            "a. 1000000000 IN A 192.0.2.1",
            "a. 99999999999 IN A 192.0.2.1",
        ] {
            let error = line.parse::<ResourceRecord>().unwrap_err();
            assert_eq!(error, TextError::TtlOutOfRange);
            assert_eq!(error.kind(), ErrorKind::Malformed);
        }
        assert!("a. 999999999 IN A 192.0.2.1".parse::<ResourceRecord>().is_ok());
        assert_eq!(
            "a. -1 IN A 192.0.2.1".parse::<ResourceRecord>(),
            Err(TextError::WrongFormat)
        );
    }

    #[test]
    fn classes_and_types_must_be_supported() {
        let error = "a. 60 CH A 192.0.2.1".parse::<ResourceRecord>().unwrap_err();
        assert_eq!(error, TextError::UnsupportedClass);
        assert_eq!(error.kind(), ErrorKind::Unsupported);

        let error = "a. 60 IN BOGUS 192.0.2.1".parse::<ResourceRecord>().unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Unsupported);

        let error = "a. 60 IN TXT \"hi\"".parse::<ResourceRecord>().unwrap_err();
        assert_eq!(error, TextError::KnownButUnsupported(Type::Txt));

        let error = "a. 60 IN TYPE28 ::1".parse::<ResourceRecord>().unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Unsupported);
    }

    #[test]
    fn missing_fields_are_malformed() {
        for line in ["a.", "a. 60", "a. 60 IN", "a. 60 IN A", "a. 60 IN A   "] {
            let error = line.parse::<ResourceRecord>().unwrap_err();
            assert_eq!(error, TextError::WrongFormat, "{}", line);
        }
    }

    #[test]
    fn trailing_text_is_rejected() {
        let error = "a. 60 IN A 192.0.2.1 extra"
            .parse::<ResourceRecord>()
            .unwrap_err();
        assert!(matches!(error, TextError::BadRdata(Type::A, _)));
        assert!("a. 60 IN NS ns.example. extra."
            .parse::<ResourceRecord>()
            .is_err());
    }

    #[test]
    fn label_length_is_bounded() {
        let ok = format!("{}.example. 60 IN A 192.0.2.1", "a".repeat(63));
        assert!(ok.parse::<ResourceRecord>().is_ok());
        let too_long = format!("{}.example. 60 IN A 192.0.2.1", "a".repeat(64));
        let error = too_long.parse::<ResourceRecord>().unwrap_err();
        assert_eq!(error, TextError::Name(name::Error::LabelTooLong));
        assert_eq!(error.kind(), ErrorKind::Malformed);
    }

    #[test]
    fn trailing_dot_strictness_is_configurable() {
        let line = "www.example 60 IN CNAME host.example";
        let error = line.parse::<ResourceRecord>().unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Unsupported);

        let relaxed = ReprOptions {
            require_trailing_dot: false,
        };
        let rr = ResourceRecord::decode_repr_with(line, relaxed).unwrap();
        assert_eq!(rr.name(), &"www.example.".parse().unwrap());
        assert_eq!(rr.rdata(), b"\x04host\x07example\x00");
    }

    #[test]
    fn repr_uses_tab_stop_columns() {
        let rr: ResourceRecord = "example. 86400 IN MX 10 mail.example.".parse().unwrap();
        let text = rr.repr().unwrap();
        let expected = format!(
            "{:<40}{:<8}{:<8}{:<8}{}",
            "example.", "86400", "IN MX", "10", "mail.example."
        );
        assert_eq!(text, expected);
        assert_eq!(rr.to_string(), expected);
        assert_eq!(text.parse::<ResourceRecord>().unwrap(), rr);
    }

    #[test]
    fn display_falls_back_to_generic_rdata() {
        let name: Name = "example.".parse().unwrap();
        let rr = ResourceRecord::new(name, Type::Txt, Class::In, 60, b"\x02hi".to_vec());
        assert_eq!(rr.repr(), Err(TextError::KnownButUnsupported(Type::Txt)));
        assert!(rr.to_string().ends_with("IN TXT  \\# 3 026869"));
    }

    #[test]
    fn wire_form_round_trips() {
        let rr: ResourceRecord = "host.example. 300 IN A 192.0.2.7".parse().unwrap();
        let mut buf = [0; 64];
        let mut writer = ByteWriter::new(&mut buf);
        rr.encode(&mut writer).unwrap();
        let len = writer.finish();
        assert_eq!(len, rr.wire_len());

        let mut reader = ByteReader::new(&buf[..len]);
        let decoded = ResourceRecord::decode(&mut reader, &SymbolTable::empty()).unwrap();
        assert_eq!(decoded, rr);
        assert!(reader.is_empty());
    }

    #[test]
    fn encode_is_all_or_nothing() {
        let rr: ResourceRecord = "host.example. 300 IN A 192.0.2.7".parse().unwrap();
        let mut buf = [0; 27];
        let mut writer = ByteWriter::new(&mut buf);
        assert_eq!(rr.encode(&mut writer), Err(Truncated));
        assert!(writer.is_empty());
    }

    #[test]
    fn decode_keeps_unknown_rdata_and_fails_cleanly_when_short() {
        let wire = b"\x00\xff\x00\x00\x01\x00\x00\x00\x3c\x00\x03abc";
        let mut reader = ByteReader::new(wire);
        let rr = ResourceRecord::decode(&mut reader, &SymbolTable::empty()).unwrap();
        assert_eq!(u16::from(rr.rr_type()), 0xff00);
        assert_eq!(rr.rdata(), b"abc");

        for end in 0..wire.len() {
            let mut reader = ByteReader::new(&wire[..end]);
            assert!(ResourceRecord::decode(&mut reader, &SymbolTable::empty()).is_err());
            assert_eq!(reader.position(), 0);
        }
    }

    #[test]
    fn with_name_copies() {
        let rr: ResourceRecord = "*.example. 60 IN A 192.0.2.1".parse().unwrap();
        let copy = rr.with_name("foo.example.".parse().unwrap());
        assert_eq!(copy.name(), &"foo.example.".parse().unwrap());
        assert_eq!(rr.name(), &"*.example.".parse().unwrap());
        assert_eq!(copy.rdata(), rr.rdata());
        assert_eq!(copy.ttl(), rr.ttl());
    }
}
