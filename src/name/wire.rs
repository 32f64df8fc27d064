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

//! Wire-format encoding and decoding of names.

use crate::bytes::{ByteReader, ByteWriter, Truncated};

use super::{Error, LabelBuf, Name, SymbolTable, MAX_WIRE_LEN};

/// The two high bits of a length octet that select the label type.
const LABEL_TYPE_MASK: u8 = 0xc0;
const LABEL_TYPE_NORMAL: u8 = 0x00;
const LABEL_TYPE_POINTER: u8 = 0xc0;

impl Name {
    /// Decodes a possibly compressed name at the reader's position.
    ///
    /// Normal labels are read until the null label. A compression
    /// pointer ends the name: the name previously decoded at the target
    /// offset is looked up in `symbols` and its labels are appended.
    /// Pointers to offsets that are not in the table are rejected with
    /// [`Error::InvalidPointer`], and the reserved `01` and `10` label
    /// types with [`Error::UnsupportedLabelType`].
    ///
    /// On failure, the reader is left where it was.
    pub fn decode(reader: &mut ByteReader, symbols: &SymbolTable) -> Result<Self, Error> {
        let mut attempt = *reader;
        let mut labels = Vec::new();
        let mut wire_len = 0;

        loop {
            let length_octet = attempt.read_u8().map_err(|_| Error::UnexpectedEom)?;
            match length_octet & LABEL_TYPE_MASK {
                LABEL_TYPE_NORMAL => {
                    let octets = attempt
                        .read_octets(length_octet as usize)
                        .map_err(|_| Error::UnexpectedEom)?;
                    wire_len += 1 + octets.len();
                    if wire_len > MAX_WIRE_LEN {
                        return Err(Error::NameTooLong);
                    }
                    labels.push(LabelBuf::try_from(octets)?);
                    if octets.is_empty() {
                        break;
                    }
                }
                LABEL_TYPE_POINTER => {
                    let low = attempt.read_u8().map_err(|_| Error::UnexpectedEom)?;
                    let offset = ((length_octet & !LABEL_TYPE_MASK) as usize) << 8 | low as usize;
                    let target = symbols.get(offset).ok_or(Error::InvalidPointer)?;
                    wire_len += target.wire_len();
                    if wire_len > MAX_WIRE_LEN {
                        return Err(Error::NameTooLong);
                    }
                    labels.extend(target.labels().iter().cloned());
                    break;
                }
                _ => return Err(Error::UnsupportedLabelType),
            }
        }

        *reader = attempt;
        Ok(Self { labels })
    }

    /// Decodes an uncompressed name that must occupy all of `octets`.
    /// This is how names embedded in stored RDATA are read.
    pub fn decode_uncompressed_all(octets: &[u8]) -> Result<Self, Error> {
        let mut reader = ByteReader::new(octets);
        let name = Self::decode(&mut reader, &SymbolTable::empty())?;
        if reader.is_empty() {
            Ok(name)
        } else {
            Err(Error::ExtraData)
        }
    }

    /// Encodes the name without compression. Either the whole name is
    /// written or nothing is.
    pub fn encode(&self, writer: &mut ByteWriter) -> Result<(), Truncated> {
        if writer.remaining() < self.wire_len() {
            return Err(Truncated);
        }
        for label in self.labels() {
            writer.write_len8_string(label.octets())?;
        }
        Ok(())
    }

    /// Returns the uncompressed wire form of the name.
    pub fn to_wire(&self) -> Vec<u8> {
        let mut wire = Vec::with_capacity(self.wire_len());
        for label in self.labels() {
            wire.push(label.len() as u8);
            wire.extend_from_slice(label.octets());
        }
        wire
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
