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

//! A minimal asynchronous stub resolver.
//!
//! The [`StubResolver`] sends one query to one upstream server over UDP
//! and waits for something that looks like an answer to it. It does no
//! retrying, no recursion and no caching; it exists so that tools like
//! `apex-dig` can talk to a server.

use std::fmt;
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use log::debug;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::time::timeout;

use crate::message::{EncodeError, Message, MAX_UDP_MESSAGE_SIZE};

/// How long [`StubResolver::resolve`] waits by default.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// Replies are read into a buffer this large, so that oversized ones
/// can still be decoded.
const RECEIVE_BUFFER_SIZE: usize = 1024;

/// A stub resolver that forwards queries to a single upstream server.
#[derive(Clone, Debug)]
pub struct StubResolver {
    upstream: SocketAddr,
    timeout: Duration,
}

impl StubResolver {
    /// Creates a resolver that queries `upstream`, waiting up to
    /// [`DEFAULT_TIMEOUT`] for a reply.
    pub fn new(upstream: SocketAddr) -> Self {
        Self {
            upstream,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Sets how long [`StubResolver::resolve`] waits for a reply.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn upstream(&self) -> SocketAddr {
        self.upstream
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Sends `query` to the upstream server and returns the first reply
    /// that looks like an attempted response to it.
    ///
    /// The query goes out from a freshly bound ephemeral UDP socket. A
    /// task spawned for that socket receives and decodes datagrams and
    /// hands them over a channel; undecodable datagrams and replies
    /// that do not match the query are logged and skipped. The whole
    /// exchange is bounded by the resolver's timeout.
    pub async fn resolve(&self, query: &Message) -> Result<Message, Error> {
        let mut buf = [0; MAX_UDP_MESSAGE_SIZE];
        let len = query.encode(&mut buf).map_err(|e| match e {
            EncodeError::Truncated => Error::QueryTooLong,
            e => Error::InvalidQuery(e),
        })?;

        let bind_addr: SocketAddr = if self.upstream.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = Arc::new(UdpSocket::bind(bind_addr).await?);
        let (sender, mut receiver) = mpsc::channel(8);
        let receive_task = tokio::spawn(receive_messages(socket.clone(), sender));

        let exchange = async {
            socket.send_to(&buf[..len], self.upstream).await?;
            debug!("Sent {} octets to {}.", len, self.upstream);
            while let Some(received) = receiver.recv().await {
                let response = received?;
                if looks_like_attempted_response_to(&response, query) {
                    return Ok(response);
                }
            }
            Err(Error::Io(io::ErrorKind::UnexpectedEof.into()))
        };
        let result = timeout(self.timeout, exchange).await;
        receive_task.abort();
        result.unwrap_or(Err(Error::TimedOut))
    }
}

/// The receive loop for a stub resolver socket. Decoded messages and
/// I/O errors are sent to the resolver; the loop ends after an I/O
/// error or once the resolver stops listening.
async fn receive_messages(socket: Arc<UdpSocket>, sender: mpsc::Sender<io::Result<Message>>) {
    let mut buf = vec![0; RECEIVE_BUFFER_SIZE];
    loop {
        let received = match socket.recv_from(&mut buf).await {
            Ok((len, source)) => match Message::decode_with_len(&buf[..len]) {
                Ok((message, decoded_len)) => {
                    debug!("Received {} octets from {}.", len, source);
                    if decoded_len != len {
                        debug!(
                            "Datagram of {} octets decoded as a message of {} octets \
                             with some trailing octets.",
                            len, decoded_len
                        );
                    }
                    Ok(message)
                }
                Err(e) => {
                    debug!("Ignoring undecodable datagram from {}: {}.", source, e);
                    continue;
                }
            },
            Err(e) => Err(e),
        };
        let failed = received.is_err();
        if sender.send(received).await.is_err() || failed {
            return;
        }
    }
}

/// Checks that `response` could be the upstream's answer to `query`.
fn looks_like_attempted_response_to(response: &Message, query: &Message) -> bool {
    let reason = if !response.is_response() {
        "it is not a response"
    } else if response.id() != query.id() {
        "it has the wrong ID"
    } else if response.questions().len() != 1 {
        "it does not have exactly one question"
    } else if response.questions().first() != query.questions().first() {
        "it has the wrong question"
    } else {
        return true;
    };
    debug!("Skipping reply because {}.", reason);
    false
}

/// An error from [`StubResolver::resolve`].
#[derive(Debug)]
pub enum Error {
    /// The query does not fit into a UDP message.
    QueryTooLong,

    /// The query has a header that cannot be encoded.
    InvalidQuery(EncodeError),

    /// No acceptable reply arrived in time.
    TimedOut,

    /// Socket I/O failed.
    Io(io::Error),
}

impl From<io::Error> for Error {
    fn from(error: io::Error) -> Self {
        Self::Io(error)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::QueryTooLong => f.write_str("query does not fit into a UDP message"),
            Self::InvalidQuery(_) => f.write_str("query cannot be encoded"),
            Self::TimedOut => f.write_str("timed out waiting for a response"),
            Self::Io(_) => f.write_str("socket I/O failed"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidQuery(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Question;
    use crate::rr::Type;

    fn www_query() -> Message {
        Message::begin_query(Question::new("www.example.".parse().unwrap(), Type::A))
    }

    async fn send(socket: &UdpSocket, message: &Message, dest: SocketAddr) {
        let mut buf = [0; MAX_UDP_MESSAGE_SIZE];
        let len = message.encode(&mut buf).unwrap();
        socket.send_to(&buf[..len], dest).await.unwrap();
    }

    #[tokio::test]
    async fn skips_replies_that_do_not_match() {
        let upstream = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let upstream_addr = upstream.local_addr().unwrap();
        let fake_upstream = tokio::spawn(async move {
            let mut buf = [0; MAX_UDP_MESSAGE_SIZE];
            let (len, client) = upstream.recv_from(&mut buf).await.unwrap();
            let query = Message::decode(&buf[..len]).unwrap();

            // Garbage, the query itself, and a response with the wrong
            // ID and question all come before the real answer.
            upstream.send_to(b"\x12", client).await.unwrap();
            send(&upstream, &query, client).await;
            let mut wrong_id = Message::begin_response(&query);
            wrong_id.set_id(query.id().wrapping_add(1));
            wrong_id.add_question(query.questions()[0].clone());
            send(&upstream, &wrong_id, client).await;
            let mut wrong_question = Message::begin_response(&query);
            wrong_question.add_question(Question::new("example.".parse().unwrap(), Type::A));
            send(&upstream, &wrong_question, client).await;

            let mut response = Message::begin_response(&query);
            response.add_question(query.questions()[0].clone());
            response.add_answer("www.example. 60 IN A 192.0.2.1".parse().unwrap());
            send(&upstream, &response, client).await;
        });

        let query = www_query();
        let response = StubResolver::new(upstream_addr)
            .with_timeout(Duration::from_secs(5))
            .resolve(&query)
            .await
            .unwrap();
        assert_eq!(response.id(), query.id());
        assert_eq!(response.answers().len(), 1);
        fake_upstream.await.unwrap();
    }

    #[tokio::test]
    async fn times_out_without_a_reply() {
        let upstream = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let resolver = StubResolver::new(upstream.local_addr().unwrap())
            .with_timeout(Duration::from_millis(100));
        assert_eq!(resolver.timeout(), Duration::from_millis(100));
        assert!(matches!(
            resolver.resolve(&www_query()).await,
            Err(Error::TimedOut)
        ));
    }

    #[tokio::test]
    async fn rejects_queries_with_unencodable_headers() {
        let mut query = www_query();
        query.set_opcode(crate::message::Opcode::Unassigned(16));
        let resolver = StubResolver::new((Ipv4Addr::LOCALHOST, 53).into());
        assert!(matches!(
            resolver.resolve(&query).await,
            Err(Error::InvalidQuery(EncodeError::OpcodeOutOfRange(16)))
        ));
    }

    #[tokio::test]
    async fn rejects_queries_that_are_too_long() {
        let mut query = www_query();
        for i in 0..20 {
            let qname = format!("{}.a-rather-long-label-to-fill-the-message.example.", i);
            query.add_question(Question::new(qname.parse().unwrap(), Type::A));
        }
        let resolver = StubResolver::new((Ipv4Addr::LOCALHOST, 53).into());
        assert!(matches!(
            resolver.resolve(&query).await,
            Err(Error::QueryTooLong)
        ));
    }
}
