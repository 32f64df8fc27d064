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

//! Implementation of the [`DomainTreeNode`] structure.

use std::collections::HashMap;
use std::io::{self, Write};

use crate::name::{Label, LabelBuf};
use crate::rr::{ResourceRecord, Type};

/// A node in the domain tree.
///
/// Each node owns the records whose owner name it represents and its
/// children, keyed by label. Since [`LabelBuf`] compares and hashes
/// case-insensitively, so do the child lookups.
#[derive(Debug, Default)]
pub struct DomainTreeNode {
    children: HashMap<LabelBuf, DomainTreeNode>,
    rrs: Vec<ResourceRecord>,
    has_soa: bool,
    has_ns: bool,
}

impl DomainTreeNode {
    /// Returns the records owned by this node, in insertion order.
    pub fn rrs(&self) -> &[ResourceRecord] {
        &self.rrs
    }

    /// Returns the records of type `rr_type` owned by this node.
    pub fn rrs_of_type(&self, rr_type: Type) -> impl Iterator<Item = &ResourceRecord> {
        self.rrs.iter().filter(move |rr| rr.rr_type() == rr_type)
    }

    /// Returns the child for `label`, if there is one.
    pub fn child(&self, label: &Label) -> Option<&Self> {
        self.children.get(label)
    }

    /// Returns the children of this node, in no particular order.
    pub fn children(&self) -> impl Iterator<Item = &Self> {
        self.children.values()
    }

    /// Returns whether this node is the top of an authoritative zone,
    /// i.e., it owns an SOA record.
    pub fn is_zone_apex(&self) -> bool {
        self.has_soa
    }

    /// Returns whether this node is a zone cut: it owns NS records but
    /// no SOA record.
    pub fn is_zone_cut(&self) -> bool {
        self.has_ns && !self.has_soa
    }

    /// Gets or creates the descendant reached by following `labels`.
    /// Any nodes in between are created too.
    pub(super) fn get_or_create_descendant<'a>(
        &mut self,
        labels: impl IntoIterator<Item = &'a Label>,
    ) -> &mut Self {
        labels.into_iter().fold(self, |node, label| {
            node.children.entry(LabelBuf::from(label)).or_default()
        })
    }

    /// Adds a record to this node.
    pub(super) fn add_rr(&mut self, rr: ResourceRecord) {
        match rr.rr_type() {
            Type::Soa => self.has_soa = true,
            Type::Ns => self.has_ns = true,
            _ => (),
        }
        self.rrs.push(rr);
    }

    /// Writes the records of this node and then of its descendants, one
    /// per line. Children are visited in label order.
    pub(super) fn write_records(&self, out: &mut impl Write) -> io::Result<()> {
        for rr in &self.rrs {
            writeln!(out, "{}", rr)?;
        }
        let mut children: Vec<_> = self.children.iter().collect();
        children.sort_unstable_by(|a, b| a.0.cmp(b.0));
        for (_, child) in children {
            child.write_records(out)?;
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::name::Name;

    #[test]
    fn get_or_create_descendant_works() {
        let name: Name = "a.b.c.".parse().unwrap();
        let mut root = DomainTreeNode::default();
        root.get_or_create_descendant(name.labels_from_root())
            .add_rr("a.b.c. 60 IN A 192.0.2.1".parse().unwrap());

        let c = root.child(Label::new(b"c").unwrap()).unwrap();
        let b = c.child(Label::new(b"B").unwrap()).unwrap();
        let a = b.child(Label::new(b"a").unwrap()).unwrap();
        assert!(b.rrs().is_empty());
        assert_eq!(a.rrs().len(), 1);

        // A second walk finds the existing nodes.
        let again = root.get_or_create_descendant(name.labels_from_root());
        assert_eq!(again.rrs().len(), 1);
    }

    #[test]
    fn apex_takes_precedence_over_cut() {
        let mut node = DomainTreeNode::default();
        node.add_rr("example. 60 IN NS ns.example.".parse().unwrap());
        assert!(node.is_zone_cut());
        assert!(!node.is_zone_apex());

        node.add_rr("example. 60 IN SOA ns.example. admin.example. 1 2 3 4 5".parse().unwrap());
        assert!(node.is_zone_apex());
        assert!(!node.is_zone_cut());
        assert_eq!(node.rrs_of_type(Type::Ns).count(), 1);
    }
}
