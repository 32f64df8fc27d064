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

//! Per-type RDATA processing.
//!
//! RDATA is stored as uncompressed wire octets. Its meaning only matters
//! when converting to or from the text form, and when decompressing
//! names embedded in RDATA read from a message. Both are driven by the
//! registry in this module, which is keyed by [`Type`].

use std::fmt::Write;
use std::net::Ipv4Addr;

use super::{TextError, Type};
use crate::bytes::ByteReader;
use crate::name::{self, Name, ReprOptions, SymbolTable};
use crate::util::{nibble_to_ascii_hex_digit, pad_to_tab_stop};

////////////////////////////////////////////////////////////////////////
// REGISTRY                                                           //
////////////////////////////////////////////////////////////////////////

type ToText = fn(&[u8]) -> Option<String>;
type FromText = fn(&str, ReprOptions) -> Result<Vec<u8>, RdataError>;

/// A failure to parse RDATA text, before it is tagged with the type.
enum RdataError {
    Format(&'static str),
    Name(name::Error),
}

impl From<&'static str> for RdataError {
    fn from(reason: &'static str) -> Self {
        Self::Format(reason)
    }
}

impl From<name::Error> for RdataError {
    fn from(error: name::Error) -> Self {
        Self::Name(error)
    }
}

/// The text codec for one RR type.
struct RdataCodec {
    to_text: ToText,
    from_text: FromText,
}

static A_CODEC: RdataCodec = RdataCodec {
    to_text: a_to_text,
    from_text: a_from_text,
};

static NAME_CODEC: RdataCodec = RdataCodec {
    to_text: name_to_text,
    from_text: name_from_text,
};

static MX_CODEC: RdataCodec = RdataCodec {
    to_text: mx_to_text,
    from_text: mx_from_text,
};

static SOA_CODEC: RdataCodec = RdataCodec {
    to_text: soa_to_text,
    from_text: soa_from_text,
};

/// Looks up the text codec for `rr_type`.
fn codec_for(rr_type: Type) -> Result<&'static RdataCodec, TextError> {
    match rr_type {
        Type::A => Ok(&A_CODEC),
        Type::Ns | Type::Cname | Type::Ptr => Ok(&NAME_CODEC),
        Type::Mx => Ok(&MX_CODEC),
        Type::Soa => Ok(&SOA_CODEC),
        Type::Txt => Err(TextError::KnownButUnsupported(rr_type)),
        _ => Err(TextError::UnsupportedType(rr_type)),
    }
}

/// Renders the RDATA of a record of type `rr_type` as text.
pub fn to_text(rr_type: Type, rdata: &[u8]) -> Result<String, TextError> {
    let codec = codec_for(rr_type)?;
    (codec.to_text)(rdata).ok_or(TextError::InvalidWireRdata(rr_type))
}

/// Parses the text form of RDATA of type `rr_type`. The whole of `text`
/// must be consumed.
pub fn from_text(rr_type: Type, text: &str, options: ReprOptions) -> Result<Vec<u8>, TextError> {
    let codec = codec_for(rr_type)?;
    (codec.from_text)(text, options).map_err(|error| match error {
        RdataError::Format(reason) => TextError::BadRdata(rr_type, reason),
        RdataError::Name(error) => TextError::Name(error),
    })
}

/// Renders RDATA in the RFC 3597 § 5 generic form, `\# <len> <hex>`.
pub fn to_generic_text(rdata: &[u8]) -> String {
    let mut text = format!("\\# {}", rdata.len());
    if !rdata.is_empty() {
        text.push(' ');
        for octet in rdata {
            text.push(nibble_to_ascii_hex_digit(octet >> 4) as char);
            text.push(nibble_to_ascii_hex_digit(octet & 0xf) as char);
        }
    }
    text
}

////////////////////////////////////////////////////////////////////////
// DECOMPRESSION                                                      //
////////////////////////////////////////////////////////////////////////

/// A field of a fixed RDATA layout.
#[derive(Clone, Copy)]
enum Field {
    Name,
    U16,
    U32,
}

/// Returns the layout of RDATA types defined by RFC 1035 that embed
/// names, which are the only ones allowed to be compressed (RFC 3597
/// § 4).
fn compressible_layout(rr_type: Type) -> Option<&'static [Field]> {
    const NAME_ONLY: &[Field] = &[Field::Name];
    const MX: &[Field] = &[Field::U16, Field::Name];
    const SOA: &[Field] = &[
        Field::Name,
        Field::Name,
        Field::U32,
        Field::U32,
        Field::U32,
        Field::U32,
        Field::U32,
    ];
    match rr_type {
        Type::Ns | Type::Cname | Type::Ptr => Some(NAME_ONLY),
        Type::Mx => Some(MX),
        Type::Soa => Some(SOA),
        _ => None,
    }
}

/// Reads the RDATA that `reader` covers in full, expanding compressed
/// names in types that may contain them.
///
/// `reader` must be positioned at the start of the RDATA within the
/// whole message, with its buffer ending where the RDATA ends, so that
/// compression pointers can be resolved. If the RDATA does not match
/// its type's layout, the octets are returned as they are so that the
/// record can still be relayed.
pub fn read_rdata(rr_type: Type, reader: ByteReader, symbols: &SymbolTable) -> Vec<u8> {
    let verbatim = |reader: ByteReader| reader.buffer()[reader.position()..].to_vec();
    let layout = match compressible_layout(rr_type) {
        Some(layout) => layout,
        None => return verbatim(reader),
    };

    let mut cursor = reader;
    let mut expanded = Vec::with_capacity(reader.remaining());
    for field in layout {
        let ok = match field {
            Field::Name => Name::decode(&mut cursor, symbols)
                .map(|name| expanded.extend_from_slice(&name.to_wire()))
                .is_ok(),
            Field::U16 => cursor
                .read_octets(2)
                .map(|octets| expanded.extend_from_slice(octets))
                .is_ok(),
            Field::U32 => cursor
                .read_octets(4)
                .map(|octets| expanded.extend_from_slice(octets))
                .is_ok(),
        };
        if !ok {
            return verbatim(reader);
        }
    }
    if cursor.is_empty() {
        expanded
    } else {
        verbatim(reader)
    }
}

////////////////////////////////////////////////////////////////////////
// TYPE-SPECIFIC CODECS                                               //
////////////////////////////////////////////////////////////////////////

fn a_to_text(rdata: &[u8]) -> Option<String> {
    let octets: [u8; 4] = rdata.try_into().ok()?;
    Some(Ipv4Addr::from(octets).to_string())
}

fn a_from_text(text: &str, _: ReprOptions) -> Result<Vec<u8>, RdataError> {
    const MALFORMED: &str = "has a malformed IP address";
    let mut octets = Vec::with_capacity(4);
    for part in text.split('.') {
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(MALFORMED.into());
        }
        octets.push(part.parse::<u8>().map_err(|_| MALFORMED)?);
    }
    if octets.len() == 4 {
        Ok(octets)
    } else {
        Err(MALFORMED.into())
    }
}

fn name_to_text(rdata: &[u8]) -> Option<String> {
    Name::decode_uncompressed_all(rdata).ok().map(|name| name.repr())
}

fn name_from_text(text: &str, options: ReprOptions) -> Result<Vec<u8>, RdataError> {
    let (name, rest) = Name::decode_repr_with(text, options)?;
    if rest.is_empty() {
        Ok(name.to_wire())
    } else {
        Err("has the wrong format".into())
    }
}

fn mx_to_text(rdata: &[u8]) -> Option<String> {
    let mut reader = ByteReader::new(rdata);
    let preference = reader.read_u16().ok()?;
    let exchange = Name::decode(&mut reader, &SymbolTable::empty()).ok()?;
    if !reader.is_empty() {
        return None;
    }
    let mut text = preference.to_string();
    pad_to_tab_stop(&mut text);
    text.push_str(&exchange.repr());
    Some(text)
}

fn mx_from_text(text: &str, options: ReprOptions) -> Result<Vec<u8>, RdataError> {
    const WRONG_FORMAT: &str = "has the wrong format";
    let (preference, rest) = next_field(text).ok_or(WRONG_FORMAT)?;
    if !preference.bytes().all(|b| b.is_ascii_digit()) || !starts_with_space(rest) {
        return Err(WRONG_FORMAT.into());
    }
    let preference: u16 = preference
        .parse()
        .map_err(|_| "has an out-of-range PREFERENCE")?;
    let (exchange, rest) = Name::decode_repr_with(rest.trim_start(), options)?;
    if !rest.is_empty() {
        return Err(WRONG_FORMAT.into());
    }
    let mut rdata = preference.to_be_bytes().to_vec();
    rdata.extend_from_slice(&exchange.to_wire());
    Ok(rdata)
}

fn soa_to_text(rdata: &[u8]) -> Option<String> {
    let mut reader = ByteReader::new(rdata);
    let mname = Name::decode(&mut reader, &SymbolTable::empty()).ok()?;
    let rname = Name::decode(&mut reader, &SymbolTable::empty()).ok()?;
    let mut text = format!("{} {}", mname.repr(), rname.repr());
    for _ in 0..5 {
        let _ = write!(text, " {}", reader.read_u32().ok()?);
    }
    if reader.is_empty() {
        Some(text)
    } else {
        None
    }
}

fn soa_from_text(text: &str, options: ReprOptions) -> Result<Vec<u8>, RdataError> {
    const WRONG_FORMAT: &str = "has the wrong format";
    let (mname, rest) = Name::decode_repr_with(text, options)?;
    if !starts_with_space(rest) {
        return Err(WRONG_FORMAT.into());
    }
    let (rname, mut rest) = Name::decode_repr_with(rest.trim_start(), options)?;
    let mut rdata = mname.to_wire();
    rdata.extend_from_slice(&rname.to_wire());
    for _ in 0..5 {
        if !starts_with_space(rest) {
            return Err(WRONG_FORMAT.into());
        }
        let (field, after) = next_field(rest).ok_or(WRONG_FORMAT)?;
        if !field.bytes().all(|b| b.is_ascii_digit()) {
            return Err(WRONG_FORMAT.into());
        }
        let value: u32 = field.parse().map_err(|_| "has an out-of-range integer field")?;
        rdata.extend_from_slice(&value.to_be_bytes());
        rest = after;
    }
    if rest.is_empty() {
        Ok(rdata)
    } else {
        Err(WRONG_FORMAT.into())
    }
}

////////////////////////////////////////////////////////////////////////
// HELPERS                                                            //
////////////////////////////////////////////////////////////////////////

/// Splits off the next whitespace-delimited field of `text`, skipping
/// leading whitespace.
pub fn next_field(text: &str) -> Option<(&str, &str)> {
    let text = text.trim_start();
    if text.is_empty() {
        return None;
    }
    let end = text
        .find(|c: char| c.is_ascii_whitespace())
        .unwrap_or(text.len());
    Some(text.split_at(end))
}

fn starts_with_space(text: &str) -> bool {
    text.starts_with(|c: char| c.is_ascii_whitespace())
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
