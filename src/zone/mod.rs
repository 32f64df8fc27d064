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

//! The in-memory domain tree and the authoritative resolver built on
//! top of it.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

use log::debug;

use crate::name::ReprOptions;
use crate::rr::ResourceRecord;

mod error;
mod lookup;
mod node;
pub use error::Error;
pub use node::DomainTreeNode;

/// Answers questions from zone data loaded into memory.
///
/// The resolver owns a tree of [`DomainTreeNode`]s rooted at the DNS
/// root. A record is stored at the node reached by walking its owner
/// name from the root. A node holding an SOA record is the apex of a
/// zone this server is authoritative for, and a node holding NS but no
/// SOA records is a zone cut delegating authority elsewhere.
///
/// The tree is only modified while loading. Afterwards the resolver is
/// shared read-only between all the tasks answering queries.
#[derive(Debug, Default)]
pub struct AuthoritativeResolver {
    root: DomainTreeNode,
}

impl AuthoritativeResolver {
    /// Creates a resolver with no data, which refuses every question.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a zone file from `path`.
    pub fn from_path(path: impl AsRef<Path>, options: ReprOptions) -> Result<Self, Error> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file), options)
    }

    /// Loads zone file text.
    pub fn from_zone_text(text: &str, options: ReprOptions) -> Result<Self, Error> {
        Self::from_reader(text.as_bytes(), options)
    }

    /// Loads a zone file, one record per line. Lines that are blank or
    /// whose first non-blank character is `;` are skipped. The first
    /// line that does not parse aborts the load.
    pub fn from_reader(reader: impl BufRead, options: ReprOptions) -> Result<Self, Error> {
        let mut resolver = Self::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim_start();
            if trimmed.is_empty() || trimmed.starts_with(';') {
                continue;
            }
            let rr = ResourceRecord::decode_repr_with(trimmed, options).map_err(|error| {
                Error::Line {
                    line: index + 1,
                    error,
                }
            })?;
            resolver.add_rr(rr);
        }
        debug!("Loaded {} records.", resolver.len());
        Ok(resolver)
    }

    /// Adds a record to the tree, creating nodes as needed.
    pub fn add_rr(&mut self, rr: ResourceRecord) {
        self.root
            .get_or_create_descendant(rr.name().labels_from_root())
            .add_rr(rr);
    }

    /// Returns the root of the domain tree.
    pub fn root(&self) -> &DomainTreeNode {
        &self.root
    }

    /// Returns the number of records in the tree.
    pub fn len(&self) -> usize {
        let mut stack = vec![&self.root];
        let mut count = 0;
        while let Some(node) = stack.pop() {
            count += node.rrs().len();
            stack.extend(node.children());
        }
        count
    }

    /// Returns whether the tree has no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Writes every record in the tree to `out` in zone-file form, one
    /// per line. The order is deterministic: depth first, with children
    /// visited in label order.
    pub fn write_records(&self, out: &mut impl Write) -> io::Result<()> {
        self.root.write_records(out)
    }

    /// Writes every record in the tree to standard output.
    pub fn print_records(&self) -> io::Result<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        self.write_records(&mut out)?;
        out.flush()
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rr::{ErrorKind, TextError};

    const ZONE: &str = "\
; A small zone.
example.        3600 IN SOA ns.example. admin.example. 1 7200 3600 1209600 300

example.        3600 IN NS ns.example.
   www.example. 300  IN A 192.0.2.1
ns.example.     300  IN A 192.0.2.53
";

    #[test]
    fn loads_records_skipping_blank_and_comment_lines() {
        let resolver = AuthoritativeResolver::from_zone_text(ZONE, ReprOptions::default()).unwrap();
        assert_eq!(resolver.len(), 4);
        assert!(!resolver.is_empty());
        assert!(AuthoritativeResolver::new().is_empty());
    }

    #[test]
    fn load_errors_carry_the_line_number() {
        let text = "example. 3600 IN NS ns.example.\n\nexample. 3600 IN TXT \"hi\"\n";
        match AuthoritativeResolver::from_zone_text(text, ReprOptions::default()) {
            Err(Error::Line { line, error }) => {
                assert_eq!(line, 3);
                assert_eq!(error.kind(), ErrorKind::Unsupported);
            }
            other => panic!("unexpected result: {:?}", other),
        }

        let text = "example. 0 IN NS ns.example.\n";
        match AuthoritativeResolver::from_zone_text(text, ReprOptions::default()) {
            Err(Error::Line { line: 1, error }) => assert_eq!(error, TextError::TtlOutOfRange),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn missing_files_are_io_errors() {
        let result = AuthoritativeResolver::from_path(
            "/nonexistent/apex/zone.txt",
            ReprOptions::default(),
        );
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn write_records_is_depth_first_in_label_order() {
        let resolver = AuthoritativeResolver::from_zone_text(ZONE, ReprOptions::default()).unwrap();
        let mut out = Vec::new();
        resolver.write_records(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let owners: Vec<&str> = text
            .lines()
            .map(|line| line.split_whitespace().next().unwrap())
            .collect();
        assert_eq!(owners, ["example.", "example.", "ns.example.", "www.example."]);
        assert!(text.lines().next().unwrap().contains("IN SOA"));

        // The dump can be loaded again.
        let reloaded = AuthoritativeResolver::from_zone_text(&text, ReprOptions::default()).unwrap();
        assert_eq!(reloaded.len(), 4);
    }
}
