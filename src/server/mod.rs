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

//! The processing logic of an authoritative DNS server.
//!
//! The [`Server`] structure is the heart of this module; see its
//! documentation for details.

use std::net::SocketAddr;
use std::sync::{Arc, PoisonError, RwLock};

use log::{debug, warn};

use crate::message::{EncodeError, Message, Opcode, Rcode, MAX_UDP_MESSAGE_SIZE};
use crate::zone::AuthoritativeResolver;

////////////////////////////////////////////////////////////////////////
// SERVER PUBLIC API AND CORE MESSAGE-HANDLING LOGIC                  //
////////////////////////////////////////////////////////////////////////

/// An authoritative DNS server, abstracted from any underlying network
/// I/O provider.
///
/// The [`Server`] structure implements the message-processing logic of
/// an authoritative DNS server. It receives, parses, and responds to
/// DNS messages through the [`Server::handle_message`] method. An
/// underlying network I/O provider is responsible for receiving these
/// messages from the network and then sending the responses that the
/// [`Server`] produces.
///
/// Answers come from an [`AuthoritativeResolver`], which can be
/// replaced at any time with [`Server::set_resolver`] (e.g. to reload
/// the zone file).
pub struct Server {
    resolver: RwLock<Arc<AuthoritativeResolver>>,
}

impl Server {
    /// Creates a new `Server` that will answer from `resolver`.
    pub fn new(resolver: Arc<AuthoritativeResolver>) -> Self {
        Self {
            resolver: RwLock::new(resolver),
        }
    }

    /// Returns the current resolver of the server.
    pub fn resolver(&self) -> Arc<AuthoritativeResolver> {
        self.resolver
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Sets the resolver of the `Server`. Message handling already in
    /// progress continues to use the old resolver, but handling started
    /// after this call completes will see the new one.
    pub fn set_resolver(&self, resolver: Arc<AuthoritativeResolver>) {
        *self
            .resolver
            .write()
            .unwrap_or_else(PoisonError::into_inner) = resolver;
    }

    /// Handles a DNS message received over UDP from `source`. This is
    /// the API through which I/O providers submit messages.
    ///
    /// `response_buf` is a buffer into which a response message may be
    /// serialized. It must be at least 512 octets long, the largest
    /// response this server sends; otherwise this method panics.
    ///
    /// A [`Response`] is returned, signifying whether a response is to
    /// be sent and, if so, how long the response message written into
    /// `response_buf` is.
    pub fn handle_message(
        &self,
        received_buf: &[u8],
        source: SocketAddr,
        response_buf: &mut [u8],
    ) -> Response {
        if response_buf.len() < MAX_UDP_MESSAGE_SIZE {
            panic!("the response buffer is not large enough");
        }

        // Malformed messages cannot be answered reliably, so they are
        // dropped.
        let (received, len) = match Message::decode_with_len(received_buf) {
            Ok(decoded) => decoded,
            Err(e) => {
                debug!(
                    "Dropping undecodable message of {} octets from {}: {}.",
                    received_buf.len(),
                    source,
                    e
                );
                return Response::None;
            }
        };
        if len != received_buf.len() {
            debug!(
                "Message of {} octets from {} was decoded from its first {} octets; \
                 ignoring the trailing octets.",
                received_buf.len(),
                source,
                len
            );
        }

        // Ignore messages that are responses.
        if received.is_response() {
            debug!("Dropping unsolicited response from {}.", source);
            return Response::None;
        }

        let mut response = Message::begin_response(&received);
        if let Some(reason) = rejection_reason(&received) {
            debug!("Rejecting message from {}: {}.", source, reason.0);
            response.set_rcode(reason.1);
        } else {
            self.resolver()
                .populate_response(&received.questions()[0], &mut response);
        }

        match response.encode(&mut response_buf[..MAX_UDP_MESSAGE_SIZE]) {
            Ok(len) => Response::Single(len),
            Err(EncodeError::Truncated) => {
                warn!(
                    "Response to {} does not fit in {} octets; dropping it.",
                    source, MAX_UDP_MESSAGE_SIZE
                );
                Response::None
            }
            Err(e) => {
                warn!("Failed to encode the response to {}: {}.", source, e);
                Response::None
            }
        }
    }
}

/// Checks whether a query is one this server does not answer, returning
/// the reason and the RCODE to respond with.
fn rejection_reason(query: &Message) -> Option<(&'static str, Rcode)> {
    if query.opcode() != Opcode::Query {
        Some(("opcode is not QUERY", Rcode::NotImp))
    } else if query.questions().len() != 1 {
        if query.questions().is_empty() {
            Some(("no questions in question section", Rcode::FormErr))
        } else {
            Some(("multiple questions in question section", Rcode::FormErr))
        }
    } else if !query.answers().is_empty() {
        Some(("records in answer section", Rcode::FormErr))
    } else if !query.authorities().is_empty() {
        Some(("records in authority section", Rcode::FormErr))
    } else if !query.additionals().is_empty() {
        // RFC 6891 § 7: a server without EDNS support responds to an
        // OPT record with FORMERR.
        Some(("records in additional section (perhaps EDNS?)", Rcode::FormErr))
    } else {
        None
    }
}

/// Indicates to the caller of [`Server::handle_message`] what kind of
/// response needs to be sent.
#[derive(Debug, Eq, PartialEq)]
pub enum Response {
    /// A single response is to be sent. The response has been written
    /// into the provided buffer. The length of the response is
    /// included.
    Single(usize),

    /// No response is to be sent.
    None,
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::fmt::Write;
    use std::net::Ipv4Addr;

    use lazy_static::lazy_static;

    use super::*;
    use crate::message::Question;
    use crate::name::ReprOptions;
    use crate::rr::{ResourceRecord, Type};

    lazy_static! {
        static ref SOURCE: SocketAddr = (Ipv4Addr::LOCALHOST, 5353).into();
        static ref SERVER: Server = {
            let mut zone = String::from(
                "example. 3600 IN SOA ns.example. admin.example. 1 2 3 4 5\n\
                 www.example. 300 IN A 192.0.2.1\n",
            );
            for i in 0..40 {
                writeln!(zone, "big.example. 300 IN A 192.0.2.{}", i).unwrap();
            }
            let resolver = AuthoritativeResolver::from_zone_text(&zone, ReprOptions::default());
            Server::new(Arc::new(resolver.unwrap()))
        };
    }

    fn query(qname: &str, qtype: Type) -> Message {
        let mut query = Message::begin_query(Question::new(qname.parse().unwrap(), qtype));
        query.set_rd(true);
        query
    }

    fn exchange(query: &Message) -> Option<Message> {
        let mut buf = [0; MAX_UDP_MESSAGE_SIZE];
        let len = query.encode(&mut buf).unwrap();
        exchange_raw(&buf[..len])
    }

    fn exchange_raw(received: &[u8]) -> Option<Message> {
        let mut response_buf = [0; MAX_UDP_MESSAGE_SIZE];
        match SERVER.handle_message(received, *SOURCE, &mut response_buf) {
            Response::Single(len) => Some(Message::decode(&response_buf[..len]).unwrap()),
            Response::None => None,
        }
    }

    #[test]
    fn answers_queries() {
        let query = query("www.example.", Type::A);
        let response = exchange(&query).unwrap();
        assert_eq!(response.id(), query.id());
        assert!(response.is_response());
        assert!(response.aa());
        assert!(response.rd());
        assert!(!response.ra());
        assert_eq!(response.rcode(), Rcode::NoError);
        assert_eq!(response.questions(), query.questions());
        assert_eq!(response.answers().len(), 1);
    }

    #[test]
    fn drops_undecodable_messages_and_responses() {
        assert!(exchange_raw(b"").is_none());
        assert!(exchange_raw(b"\x00\x01\x00\x00\x00\x01\x00\x00\x00\x00\x00\x00\x03www").is_none());

        let mut response = query("www.example.", Type::A);
        response.set_qr(true);
        assert!(exchange(&response).is_none());
    }

    #[test]
    fn ignores_trailing_octets() {
        let query = query("www.example.", Type::A);
        let mut buf = [0; MAX_UDP_MESSAGE_SIZE];
        let len = query.encode(&mut buf).unwrap();
        let response = exchange_raw(&buf[..len + 3]).unwrap();
        assert_eq!(response.rcode(), Rcode::NoError);
    }

    #[test]
    fn rejects_other_opcodes() {
        let mut query = query("www.example.", Type::A);
        query.set_opcode(Opcode::Status);
        let response = exchange(&query).unwrap();
        assert_eq!(response.rcode(), Rcode::NotImp);
        assert_eq!(response.opcode(), Opcode::Status);
    }

    #[test]
    fn rejects_wrong_question_counts() {
        let mut no_questions = Message::default();
        no_questions.set_id(7);
        let response = exchange(&no_questions).unwrap();
        assert_eq!(response.rcode(), Rcode::FormErr);
        assert_eq!(response.id(), 7);

        let mut two_questions = query("www.example.", Type::A);
        two_questions.add_question(Question::new("example.".parse().unwrap(), Type::Soa));
        assert_eq!(exchange(&two_questions).unwrap().rcode(), Rcode::FormErr);
    }

    #[test]
    fn rejects_records_in_queries() {
        let rr: ResourceRecord = "www.example. 300 IN A 192.0.2.1".parse().unwrap();
        let mut with_answer = query("www.example.", Type::A);
        with_answer.add_answer(rr.clone());
        assert_eq!(exchange(&with_answer).unwrap().rcode(), Rcode::FormErr);

        let mut with_authority = query("www.example.", Type::A);
        with_authority.add_authority(rr);
        assert_eq!(exchange(&with_authority).unwrap().rcode(), Rcode::FormErr);

        // An EDNS OPT pseudo-record.
        let opt = ResourceRecord::new(
            crate::name::Name::root(),
            Type::from(41),
            crate::class::Class::from(1232),
            0,
            Vec::new(),
        );
        let mut with_opt = query("www.example.", Type::A);
        with_opt.add_additional(opt);
        let response = exchange(&with_opt).unwrap();
        assert_eq!(response.rcode(), Rcode::FormErr);
        assert!(response.questions().is_empty());
    }

    #[test]
    fn drops_responses_that_do_not_fit() {
        assert!(exchange(&query("big.example.", Type::A)).is_none());
        assert_eq!(
            exchange(&query("nosuch.example.", Type::A)).unwrap().rcode(),
            Rcode::NxDomain
        );
    }

    #[test]
    fn resolver_can_be_replaced() {
        let server = Server::new(Arc::new(AuthoritativeResolver::new()));
        let query = query("www.example.", Type::A);
        let mut buf = [0; MAX_UDP_MESSAGE_SIZE];
        let len = query.encode(&mut buf).unwrap();
        let mut response_buf = [0; MAX_UDP_MESSAGE_SIZE];

        let response_len = match server.handle_message(&buf[..len], *SOURCE, &mut response_buf) {
            Response::Single(response_len) => response_len,
            Response::None => panic!("no response"),
        };
        let response = Message::decode(&response_buf[..response_len]).unwrap();
        assert_eq!(response.rcode(), Rcode::Refused);

        server.set_resolver(SERVER.resolver());
        let response_len = match server.handle_message(&buf[..len], *SOURCE, &mut response_buf) {
            Response::Single(response_len) => response_len,
            Response::None => panic!("no response"),
        };
        let response = Message::decode(&response_buf[..response_len]).unwrap();
        assert_eq!(response.rcode(), Rcode::NoError);
    }

    #[test]
    #[should_panic(expected = "the response buffer is not large enough")]
    fn handle_message_rejects_short_buffers() {
        let mut not_quite_large_enough = [0; MAX_UDP_MESSAGE_SIZE - 1];
        SERVER.handle_message(&[], *SOURCE, &mut not_quite_large_enough);
    }
}
