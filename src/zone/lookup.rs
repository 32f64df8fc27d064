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

//! Implementation of step 3 of the lookup process for nameservers, as
//! described in [RFC 1034 § 4.3.2].
//!
//! The question's QNAME is followed down the domain tree from the root.
//! Along the way, every node that is a zone apex puts the walk inside
//! authoritative data, and every node that is a zone cut takes it back
//! out (the NS records at a cut are not authoritative; see [RFC 1034
//! § 4.2.1]). When there is no child for the next label, a `*` child is
//! taken instead, and the walk ends there. The state after the last
//! node visited decides the kind of response.
//!
//! [RFC 1034 § 4.2.1]: https://datatracker.ietf.org/doc/html/rfc1034#section-4.2.1
//! [RFC 1034 § 4.3.2]: https://datatracker.ietf.org/doc/html/rfc1034#section-4.3.2

use log::trace;

use super::{AuthoritativeResolver, DomainTreeNode};
use crate::message::{Message, Question, Rcode};
use crate::name::Label;
use crate::rr::Type;

/// What the walk down the tree found.
enum Outcome<'a> {
    /// The walk ended at a node for QNAME itself.
    Exact(&'a DomainTreeNode),

    /// The walk ended at a wildcard node matching QNAME.
    Wildcard(&'a DomainTreeNode),

    /// No node matches QNAME.
    Nothing,
}

/// The state of the walk: the outcome so far, and the deepest zone
/// apex and zone cut seen.
struct Walk<'a> {
    outcome: Outcome<'a>,
    in_authoritative_zone: bool,
    last_apex: Option<&'a DomainTreeNode>,
    last_cut: Option<&'a DomainTreeNode>,
}

impl<'a> Walk<'a> {
    fn visit(&mut self, node: &'a DomainTreeNode) {
        if node.is_zone_apex() {
            self.in_authoritative_zone = true;
            self.last_apex = Some(node);
        } else if node.is_zone_cut() {
            self.in_authoritative_zone = false;
            self.last_cut = Some(node);
        }
    }
}

impl AuthoritativeResolver {
    /// Answers `question` into `response`, which should have been
    /// created with [`Message::begin_response`].
    ///
    /// The question is echoed in the question section. Then:
    ///
    /// * inside authoritative data, a name that does not exist gets
    ///   NXDOMAIN and the SOA record of the zone in the authority
    ///   section;
    /// * inside authoritative data, a name that exists (or is matched
    ///   by a wildcard) gets NOERROR and its records of the requested
    ///   type in the answer section. Records from a wildcard are copied
    ///   with their owner changed to QNAME;
    /// * below a zone cut, the response is a referral: NOERROR, and
    ///   the NS records of the cut in the authority section;
    /// * a name with no zone above it at all gets REFUSED.
    ///
    /// AA is set only for authoritative answers. Glue records are not
    /// added to referrals.
    pub fn populate_response(&self, question: &Question, response: &mut Message) {
        response.add_question(question.clone());
        let walk = self.walk(question);
        response.set_aa(walk.in_authoritative_zone);

        if walk.in_authoritative_zone {
            match walk.outcome {
                Outcome::Nothing => {
                    trace!("{} does not exist", question.qname);
                    response.set_rcode(Rcode::NxDomain);
                    let soa = walk.last_apex.and_then(|apex| apex.rrs_of_type(Type::Soa).next());
                    if let Some(soa) = soa {
                        response.add_authority(soa.clone());
                    }
                }
                Outcome::Exact(node) | Outcome::Wildcard(node) => {
                    response.set_rcode(Rcode::NoError);
                    let wildcard = matches!(walk.outcome, Outcome::Wildcard(_));
                    for rr in node.rrs() {
                        if question.qtype == Type::Any || question.qtype == rr.rr_type() {
                            if wildcard {
                                response.add_answer(rr.with_name(question.qname.clone()));
                            } else {
                                response.add_answer(rr.clone());
                            }
                        }
                    }
                    trace!(
                        "answered {} with {} records",
                        question.qname,
                        response.answers().len()
                    );
                }
            }
        } else if let Some(cut) = walk.last_cut {
            trace!("referring {} to a delegated zone", question.qname);
            response.set_rcode(Rcode::NoError);
            for ns in cut.rrs_of_type(Type::Ns) {
                response.add_authority(ns.clone());
            }
        } else {
            trace!("no authority for {}", question.qname);
            response.set_rcode(Rcode::Refused);
        }
    }

    /// Walks the tree along QNAME.
    fn walk(&self, question: &Question) -> Walk<'_> {
        let mut walk = Walk {
            outcome: Outcome::Exact(self.root()),
            in_authoritative_zone: false,
            last_apex: None,
            last_cut: None,
        };
        let mut node = self.root();
        let mut labels = question.qname.labels_from_root();
        loop {
            walk.visit(node);
            if matches!(walk.outcome, Outcome::Wildcard(_)) {
                break;
            }
            let label = match labels.next() {
                Some(label) => label,
                None => break,
            };
            if let Some(child) = node.child(label) {
                node = child;
                walk.outcome = Outcome::Exact(child);
            } else if let Some(child) = node.child(Label::asterisk()) {
                node = child;
                walk.outcome = Outcome::Wildcard(child);
            } else {
                walk.outcome = Outcome::Nothing;
                break;
            }
        }
        walk
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use lazy_static::lazy_static;

    use super::*;
    use crate::name::{Name, ReprOptions};
    use crate::rr::ResourceRecord;

    const ZONE: &str = "\
example.                3600 IN SOA ns.example. admin.example. 1 7200 3600 1209600 300
example.                3600 IN NS ns.example.
example.                3600 IN MX 10 mail.example.
ns.example.             300  IN A 192.0.2.53
www.example.            300  IN A 192.0.2.1
www.example.            300  IN A 192.0.2.2
WWW.Example.            300  IN MX 20 mail.example.
*.wild.example.         300  IN A 192.0.2.99
*.wild.example.         300  IN MX 5 mail.example.
sub.example.            3600 IN NS ns1.sub.example.
sub.example.            3600 IN NS ns2.sub.example.
ns1.sub.example.        300  IN A 192.0.2.101
inner.sub.example.      3600 IN SOA ns1.sub.example. admin.example. 1 2 3 4 5
other.test.             3600 IN NS ns.other.test.
";

    lazy_static! {
        static ref RESOLVER: AuthoritativeResolver =
            AuthoritativeResolver::from_zone_text(ZONE, ReprOptions::default()).unwrap();
    }

    fn ask(qname: &str, qtype: Type) -> Message {
        let question = Question::new(qname.parse().unwrap(), qtype);
        let query = Message::begin_query(question.clone());
        let mut response = Message::begin_response(&query);
        RESOLVER.populate_response(&question, &mut response);
        assert_eq!(response.questions(), [question]);
        response
    }

    fn rr(text: &str) -> ResourceRecord {
        text.parse().unwrap()
    }

    #[test]
    fn exact_match_returns_records_of_the_qtype() {
        let response = ask("www.example.", Type::A);
        assert_eq!(response.rcode(), Rcode::NoError);
        assert!(response.aa());
        assert_eq!(
            response.answers(),
            [
                rr("www.example. 300 IN A 192.0.2.1"),
                rr("www.example. 300 IN A 192.0.2.2"),
            ]
        );
        assert!(response.authorities().is_empty());
    }

    #[test]
    fn lookup_is_case_insensitive_and_preserves_stored_case() {
        let response = ask("wWw.EXAMPLE.", Type::Mx);
        assert_eq!(response.answers().len(), 1);
        assert_eq!(response.answers()[0].name().to_string(), "WWW.Example.");
    }

    #[test]
    fn qtype_any_returns_everything() {
        let response = ask("www.example.", Type::Any);
        assert_eq!(response.answers().len(), 3);
    }

    #[test]
    fn existing_name_without_the_qtype_is_empty_noerror() {
        let response = ask("ns.example.", Type::Mx);
        assert_eq!(response.rcode(), Rcode::NoError);
        assert!(response.aa());
        assert!(response.answers().is_empty());
    }

    #[test]
    fn apex_is_authoritative_even_though_it_has_ns() {
        let response = ask("example.", Type::Ns);
        assert_eq!(response.rcode(), Rcode::NoError);
        assert!(response.aa());
        assert_eq!(response.answers(), [rr("example. 3600 IN NS ns.example.")]);
        assert!(response.authorities().is_empty());
    }

    #[test]
    fn nxdomain_includes_the_soa() {
        let response = ask("nosuch.example.", Type::A);
        assert_eq!(response.rcode(), Rcode::NxDomain);
        assert!(response.aa());
        assert!(response.answers().is_empty());
        assert_eq!(response.authorities().len(), 1);
        assert_eq!(response.authorities()[0].rr_type(), Type::Soa);
        assert_eq!(response.authorities()[0].name(), &"example.".parse::<Name>().unwrap());
    }

    #[test]
    fn wildcard_answers_are_renamed_copies() {
        let response = ask("foo.wild.example.", Type::A);
        assert_eq!(response.rcode(), Rcode::NoError);
        assert!(response.aa());
        assert_eq!(response.answers(), [rr("foo.wild.example. 300 IN A 192.0.2.99")]);

        // The stored record is left alone.
        let wildcard = RESOLVER
            .root()
            .child(Label::new(b"example").unwrap())
            .and_then(|node| node.child(Label::new(b"wild").unwrap()))
            .and_then(|node| node.child(Label::asterisk()))
            .unwrap();
        assert!(wildcard.rrs().iter().all(|rr| rr.name().is_wildcard()));
    }

    #[test]
    fn wildcard_ends_the_walk() {
        let response = ask("a.b.wild.example.", Type::Mx);
        assert_eq!(response.rcode(), Rcode::NoError);
        assert_eq!(response.answers(), [rr("a.b.wild.example. 300 IN MX 5 mail.example.")]);
    }

    #[test]
    fn names_below_a_cut_get_a_referral() {
        let response = ask("host.sub.example.", Type::A);
        assert_eq!(response.rcode(), Rcode::NoError);
        assert!(!response.aa());
        assert!(response.answers().is_empty());
        assert_eq!(
            response.authorities(),
            [
                rr("sub.example. 3600 IN NS ns1.sub.example."),
                rr("sub.example. 3600 IN NS ns2.sub.example."),
            ]
        );
        assert!(response.additionals().is_empty());

        // Glue below the cut is not authoritative data either.
        let response = ask("ns1.sub.example.", Type::A);
        assert!(!response.aa());
        assert!(response.answers().is_empty());
        assert_eq!(response.authorities().len(), 2);
    }

    #[test]
    fn the_cut_itself_gets_a_referral() {
        let response = ask("sub.example.", Type::Ns);
        assert_eq!(response.rcode(), Rcode::NoError);
        assert!(!response.aa());
        assert!(response.answers().is_empty());
        assert_eq!(response.authorities().len(), 2);
    }

    #[test]
    fn an_apex_below_a_cut_is_authoritative_again() {
        let response = ask("inner.sub.example.", Type::Soa);
        assert_eq!(response.rcode(), Rcode::NoError);
        assert!(response.aa());
        assert_eq!(response.answers().len(), 1);

        let response = ask("nosuch.inner.sub.example.", Type::A);
        assert_eq!(response.rcode(), Rcode::NxDomain);
        assert_eq!(
            response.authorities()[0].name(),
            &"inner.sub.example.".parse::<Name>().unwrap()
        );
    }

    #[test]
    fn cut_without_an_apex_above_is_still_a_referral() {
        let response = ask("www.other.test.", Type::A);
        assert_eq!(response.rcode(), Rcode::NoError);
        assert!(!response.aa());
        assert_eq!(response.authorities(), [rr("other.test. 3600 IN NS ns.other.test.")]);
    }

    #[test]
    fn names_without_authority_are_refused() {
        for qname in [".", "com.", "www.example.com.", "test."] {
            let response = ask(qname, Type::A);
            assert_eq!(response.rcode(), Rcode::Refused, "{}", qname);
            assert!(!response.aa());
            assert!(response.answers().is_empty());
            assert!(response.authorities().is_empty());
        }
    }

    #[test]
    fn empty_resolver_refuses_everything() {
        let question = Question::new("example.".parse().unwrap(), Type::A);
        let mut response = Message::begin_response(&Message::begin_query(question.clone()));
        AuthoritativeResolver::new().populate_response(&question, &mut response);
        assert_eq!(response.rcode(), Rcode::Refused);
    }
}
