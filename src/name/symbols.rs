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

//! Implementation of the [`SymbolTable`] used for name decompression.

use crate::bytes::ByteReader;

use super::Name;

/// Only names starting within this many octets of the start of a
/// message can be the target of a compression pointer.
pub const MAX_POINTER_TARGETS: usize = 64;

/// The set of names that compression pointers in one message may refer
/// to, keyed by their offset in the message.
///
/// The table is built once per message, before any section is decoded,
/// by speculatively decoding a name at each of the first 64 offsets.
/// Offsets are tried in increasing order, and each attempt may itself
/// follow pointers to offsets already in the table. A pointer can
/// therefore only ever refer backwards, which rules out loops. Offsets
/// at which no valid name can be decoded are simply absent.
#[derive(Clone, Debug, Default)]
pub struct SymbolTable {
    names: Vec<Option<Name>>,
}

impl SymbolTable {
    /// Returns a table with no entries, for decoding data in which
    /// compression is not allowed.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds the table for `message`.
    pub fn build(message: &[u8]) -> Self {
        let scan_len = message.len().min(MAX_POINTER_TARGETS);
        let mut table = Self {
            names: Vec::with_capacity(scan_len),
        };
        for offset in 0..scan_len {
            let mut reader = ByteReader::at(message, offset);
            let name = Name::decode(&mut reader, &table).ok();
            table.names.push(name);
        }
        table
    }

    /// Looks up the name decoded at `offset`.
    pub fn get(&self, offset: usize) -> Option<&Name> {
        self.names.get(offset).and_then(Option::as_ref)
    }

    /// Returns the number of valid pointer targets.
    pub fn len(&self) -> usize {
        self.names.iter().filter(|name| name.is_some()).count()
    }

    /// Returns whether there are no valid pointer targets.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_records_every_decodable_offset() {
        let message = b"\x01a\x00\x01b\xc0\x00";
        let table = SymbolTable::build(message);
        assert_eq!(table.get(0), Some(&"a.".parse().unwrap()));
        assert_eq!(table.get(2), Some(&Name::root()));
        assert_eq!(table.get(3), Some(&"b.a.".parse().unwrap()));
        assert_eq!(table.get(5), Some(&"a.".parse().unwrap()));
        assert_eq!(table.get(1), None);
        assert_eq!(table.get(4), None);
    }

    #[test]
    fn build_only_scans_the_first_64_octets() {
        let message = [0u8; 100];
        let table = SymbolTable::build(&message);
        assert_eq!(table.len(), MAX_POINTER_TARGETS);
        assert!(table.get(63).is_some());
        assert!(table.get(64).is_none());
    }

    #[test]
    fn forward_and_self_pointers_are_rejected() {
        // A pointer at offset 0 to itself and one at offset 2 forward
        // to offset 4.
        let message = b"\xc0\x00\xc0\x04\x00";
        let table = SymbolTable::build(message);
        assert!(table.get(0).is_none());
        assert!(table.get(2).is_none());
        assert_eq!(table.get(4), Some(&Name::root()));
    }

    #[test]
    fn empty_table_is_empty() {
        assert!(SymbolTable::empty().is_empty());
        assert!(SymbolTable::build(b"").is_empty());
    }
}
