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

//! Bounds-checked cursors for reading and writing big-endian wire
//! data.
//!
//! Every operation validates the remaining room before it touches the
//! buffer. When there is not enough room, the operation fails with
//! [`Truncated`] and the cursor does not move, so callers can simply
//! propagate the failure with `?`.

use std::fmt;

////////////////////////////////////////////////////////////////////////
// READING                                                            //
////////////////////////////////////////////////////////////////////////

/// A read cursor over a bounded byte range.
///
/// `ByteReader` is [`Copy`], which makes it cheap to take a snapshot
/// before a speculative multi-step read and to commit it only once all
/// the steps have succeeded.
#[derive(Clone, Copy, Debug)]
pub struct ByteReader<'a> {
    octets: &'a [u8],
    cursor: usize,
}

impl<'a> ByteReader<'a> {
    /// Creates a reader positioned at the start of `octets`.
    pub fn new(octets: &'a [u8]) -> Self {
        Self { octets, cursor: 0 }
    }

    /// Creates a reader over `octets` positioned at `position`. The
    /// position is clamped to the end of the buffer.
    pub fn at(octets: &'a [u8], position: usize) -> Self {
        Self {
            octets,
            cursor: position.min(octets.len()),
        }
    }

    /// Returns the full underlying buffer, including the part already
    /// consumed.
    pub fn buffer(&self) -> &'a [u8] {
        self.octets
    }

    /// Returns the current offset from the start of the buffer.
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Returns the number of octets left to read.
    pub fn remaining(&self) -> usize {
        self.octets.len() - self.cursor
    }

    /// Returns whether the reader has consumed the whole buffer.
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Reads `len` raw octets.
    pub fn read_octets(&mut self, len: usize) -> Result<&'a [u8], Truncated> {
        if self.remaining() < len {
            return Err(Truncated);
        }
        let octets = &self.octets[self.cursor..self.cursor + len];
        self.cursor += len;
        Ok(octets)
    }

    pub fn read_u8(&mut self) -> Result<u8, Truncated> {
        self.read_octets(1).map(|octets| octets[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, Truncated> {
        self.read_octets(2)
            .map(|octets| u16::from_be_bytes([octets[0], octets[1]]))
    }

    pub fn read_u32(&mut self) -> Result<u32, Truncated> {
        self.read_octets(4)
            .map(|octets| u32::from_be_bytes([octets[0], octets[1], octets[2], octets[3]]))
    }

    /// Reads a string prefixed by a one-octet length.
    pub fn read_len8_string(&mut self) -> Result<&'a [u8], Truncated> {
        let mut attempt = *self;
        let len = attempt.read_u8()? as usize;
        let octets = attempt.read_octets(len)?;
        *self = attempt;
        Ok(octets)
    }

    /// Reads a string prefixed by a two-octet length.
    pub fn read_len16_string(&mut self) -> Result<&'a [u8], Truncated> {
        let mut attempt = *self;
        let len = attempt.read_u16()? as usize;
        let octets = attempt.read_octets(len)?;
        *self = attempt;
        Ok(octets)
    }
}

////////////////////////////////////////////////////////////////////////
// WRITING                                                            //
////////////////////////////////////////////////////////////////////////

/// A write cursor over a bounded, caller-provided buffer.
#[derive(Debug)]
pub struct ByteWriter<'a> {
    buf: &'a mut [u8],
    cursor: usize,
}

impl<'a> ByteWriter<'a> {
    /// Creates a writer that fills `buf` from the start.
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, cursor: 0 }
    }

    /// Returns the number of octets written so far.
    pub fn len(&self) -> usize {
        self.cursor
    }

    /// Returns whether nothing has been written yet.
    pub fn is_empty(&self) -> bool {
        self.cursor == 0
    }

    /// Returns the number of octets that may still be written.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.cursor
    }

    /// Returns the octets written so far.
    pub fn written(&self) -> &[u8] {
        &self.buf[..self.cursor]
    }

    /// Consumes the writer, returning the number of octets written.
    pub fn finish(self) -> usize {
        self.cursor
    }

    pub fn write_octets(&mut self, octets: &[u8]) -> Result<(), Truncated> {
        if self.remaining() < octets.len() {
            return Err(Truncated);
        }
        self.buf[self.cursor..self.cursor + octets.len()].copy_from_slice(octets);
        self.cursor += octets.len();
        Ok(())
    }

    pub fn write_u8(&mut self, value: u8) -> Result<(), Truncated> {
        self.write_octets(&[value])
    }

    pub fn write_u16(&mut self, value: u16) -> Result<(), Truncated> {
        self.write_octets(&value.to_be_bytes())
    }

    pub fn write_u32(&mut self, value: u32) -> Result<(), Truncated> {
        self.write_octets(&value.to_be_bytes())
    }

    /// Writes a string prefixed by a one-octet length. Strings longer
    /// than 255 octets cannot be represented and are rejected.
    pub fn write_len8_string(&mut self, octets: &[u8]) -> Result<(), Truncated> {
        let len = u8::try_from(octets.len()).map_err(|_| Truncated)?;
        if self.remaining() < 1 + octets.len() {
            return Err(Truncated);
        }
        self.write_u8(len)?;
        self.write_octets(octets)
    }

    /// Writes a string prefixed by a two-octet length. Strings longer
    /// than 65,535 octets cannot be represented and are rejected.
    pub fn write_len16_string(&mut self, octets: &[u8]) -> Result<(), Truncated> {
        let len = u16::try_from(octets.len()).map_err(|_| Truncated)?;
        if self.remaining() < 2 + octets.len() {
            return Err(Truncated);
        }
        self.write_u16(len)?;
        self.write_octets(octets)
    }
}

////////////////////////////////////////////////////////////////////////
// ERRORS                                                             //
////////////////////////////////////////////////////////////////////////

/// The "no progress" signal: the buffer did not have room for the
/// requested read or write.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Truncated;

impl fmt::Display for Truncated {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("not enough room in the buffer")
    }
}

impl std::error::Error for Truncated {}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
