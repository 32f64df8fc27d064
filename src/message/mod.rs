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

//! DNS messages and their wire and text forms.

use std::fmt;

use crate::bytes::{ByteReader, ByteWriter, Truncated};
use crate::name::{self, SymbolTable};
use crate::rr::ResourceRecord;

mod constants;
mod opcode;
mod question;
mod rcode;
pub use constants::{HEADER_SIZE, MAX_UDP_MESSAGE_SIZE};
use constants::*;
pub use opcode::{IntoOpcodeError, Opcode};
pub use question::Question;
pub use rcode::{IntoRcodeError, Rcode};

////////////////////////////////////////////////////////////////////////
// MESSAGES                                                           //
////////////////////////////////////////////////////////////////////////

/// A DNS message: a query or a response.
///
/// The section counts of the header are not stored. They are taken
/// from the lengths of the section lists when encoding, and bound the
/// number of entries read when decoding.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Message {
    id: u16,
    qr: bool,
    opcode: Opcode,
    aa: bool,
    tc: bool,
    rd: bool,
    ra: bool,
    rcode: Rcode,
    questions: Vec<Question>,
    answers: Vec<ResourceRecord>,
    authorities: Vec<ResourceRecord>,
    additionals: Vec<ResourceRecord>,
}

impl Default for Message {
    fn default() -> Self {
        Self {
            id: 0,
            qr: false,
            opcode: Opcode::Query,
            aa: false,
            tc: false,
            rd: false,
            ra: false,
            rcode: Rcode::NoError,
            questions: Vec::new(),
            answers: Vec::new(),
            authorities: Vec::new(),
            additionals: Vec::new(),
        }
    }
}

impl Message {
    /// Creates a standard query for `question` with a random ID.
    pub fn begin_query(question: Question) -> Self {
        Self {
            id: rand::random(),
            questions: vec![question],
            ..Self::default()
        }
    }

    /// Creates an empty response to `query`. The ID, opcode and RD bit
    /// are copied from the query; the response is marked authoritative
    /// and recursion is not available.
    pub fn begin_response(query: &Self) -> Self {
        Self {
            id: query.id,
            qr: true,
            opcode: query.opcode,
            aa: true,
            rd: query.rd,
            ra: false,
            ..Self::default()
        }
    }

    pub fn id(&self) -> u16 {
        self.id
    }

    pub fn set_id(&mut self, id: u16) {
        self.id = id;
    }

    /// Returns whether the message is a response (the QR bit).
    pub fn is_response(&self) -> bool {
        self.qr
    }

    pub fn set_qr(&mut self, qr: bool) {
        self.qr = qr;
    }

    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    /// Sets the opcode. An [`Opcode::Unassigned`] carrying an assigned
    /// value is stored as the named variant.
    pub fn set_opcode(&mut self, opcode: Opcode) {
        self.opcode = Opcode::try_from(u8::from(opcode)).unwrap_or(opcode);
    }

    pub fn aa(&self) -> bool {
        self.aa
    }

    pub fn set_aa(&mut self, aa: bool) {
        self.aa = aa;
    }

    pub fn tc(&self) -> bool {
        self.tc
    }

    pub fn set_tc(&mut self, tc: bool) {
        self.tc = tc;
    }

    pub fn rd(&self) -> bool {
        self.rd
    }

    pub fn set_rd(&mut self, rd: bool) {
        self.rd = rd;
    }

    pub fn ra(&self) -> bool {
        self.ra
    }

    pub fn set_ra(&mut self, ra: bool) {
        self.ra = ra;
    }

    pub fn rcode(&self) -> Rcode {
        self.rcode
    }

    /// Sets the RCODE. An [`Rcode::Unassigned`] carrying an assigned
    /// value is stored as the named variant.
    pub fn set_rcode(&mut self, rcode: Rcode) {
        self.rcode = Rcode::try_from(u8::from(rcode)).unwrap_or(rcode);
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn answers(&self) -> &[ResourceRecord] {
        &self.answers
    }

    pub fn authorities(&self) -> &[ResourceRecord] {
        &self.authorities
    }

    pub fn additionals(&self) -> &[ResourceRecord] {
        &self.additionals
    }

    pub fn add_question(&mut self, question: Question) {
        self.questions.push(question);
    }

    pub fn add_answer(&mut self, rr: ResourceRecord) {
        self.answers.push(rr);
    }

    pub fn add_authority(&mut self, rr: ResourceRecord) {
        self.authorities.push(rr);
    }

    pub fn add_additional(&mut self, rr: ResourceRecord) {
        self.additionals.push(rr);
    }

    /// Returns the flags word of the header.
    fn flags(&self) -> u16 {
        let mut flags = (u16::from(u8::from(self.opcode)) & OPCODE_MASK) << OPCODE_SHIFT;
        flags |= u16::from(u8::from(self.rcode)) & RCODE_MASK;
        for (bit, mask) in [
            (self.qr, QR_MASK),
            (self.aa, AA_MASK),
            (self.tc, TC_MASK),
            (self.rd, RD_MASK),
            (self.ra, RA_MASK),
        ] {
            if bit {
                flags |= mask;
            }
        }
        flags
    }
}

////////////////////////////////////////////////////////////////////////
// WIRE FORM                                                          //
////////////////////////////////////////////////////////////////////////

impl Message {
    /// Decodes a message. Octets after the last record are ignored; see
    /// [`Message::decode_with_len`] to find out whether there were any.
    pub fn decode(octets: &[u8]) -> Result<Self, Error> {
        Self::decode_with_len(octets).map(|(message, _)| message)
    }

    /// Decodes a message, also returning the number of octets it took
    /// up. Any failure anywhere aborts the whole decode.
    pub fn decode_with_len(octets: &[u8]) -> Result<(Self, usize), Error> {
        let mut reader = ByteReader::new(octets);
        let mut header = [0u16; 6];
        for field in header.iter_mut() {
            *field = reader.read_u16().map_err(|_| Error::HeaderTooShort)?;
        }
        let [id, flags, qdcount, ancount, nscount, arcount] = header;

        let symbols = SymbolTable::build(octets);
        let mut questions = Vec::new();
        for _ in 0..qdcount {
            let question =
                Question::decode(&mut reader, &symbols).map_err(Error::InvalidQuestion)?;
            questions.push(question);
        }
        let mut read_section = |count: u16| -> Result<Vec<ResourceRecord>, Error> {
            let mut rrs = Vec::new();
            for _ in 0..count {
                rrs.push(ResourceRecord::decode(&mut reader, &symbols).map_err(Error::InvalidRecord)?);
            }
            Ok(rrs)
        };
        let answers = read_section(ancount)?;
        let authorities = read_section(nscount)?;
        let additionals = read_section(arcount)?;

        let message = Self {
            id,
            qr: flags & QR_MASK != 0,
            opcode: Opcode::from_four_bits((flags >> OPCODE_SHIFT) as u8),
            aa: flags & AA_MASK != 0,
            tc: flags & TC_MASK != 0,
            rd: flags & RD_MASK != 0,
            ra: flags & RA_MASK != 0,
            rcode: Rcode::from_four_bits(flags as u8),
            questions,
            answers,
            authorities,
            additionals,
        };
        Ok((message, reader.position()))
    }

    /// Encodes the message into `buf`, returning the length of the
    /// encoded message. Fails if the opcode or RCODE does not fit into
    /// its four header bits, if `buf` is too small, or if a section has
    /// more than 65,535 entries.
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize, EncodeError> {
        let opcode = u8::from(self.opcode);
        if opcode > OPCODE_MASK as u8 {
            return Err(EncodeError::OpcodeOutOfRange(opcode));
        }
        let rcode = u8::from(self.rcode);
        if rcode > RCODE_MASK as u8 {
            return Err(EncodeError::RcodeOutOfRange(rcode));
        }

        let count = |len: usize| u16::try_from(len).map_err(|_| Truncated);
        let mut writer = ByteWriter::new(buf);
        writer.write_u16(self.id)?;
        writer.write_u16(self.flags())?;
        writer.write_u16(count(self.questions.len())?)?;
        writer.write_u16(count(self.answers.len())?)?;
        writer.write_u16(count(self.authorities.len())?)?;
        writer.write_u16(count(self.additionals.len())?)?;
        for question in &self.questions {
            question.encode(&mut writer)?;
        }
        for rr in self.answers.iter().chain(&self.authorities).chain(&self.additionals) {
            rr.encode(&mut writer)?;
        }
        Ok(writer.finish())
    }
}

////////////////////////////////////////////////////////////////////////
// TEXT FORM                                                          //
////////////////////////////////////////////////////////////////////////

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            ";; ->>HEADER<<- opcode: {}, status: {}, id: {}",
            self.opcode, self.rcode, self.id
        )?;
        f.write_str(";; flags:")?;
        for (bit, name) in [
            (self.qr, "qr"),
            (self.aa, "aa"),
            (self.tc, "tc"),
            (self.rd, "rd"),
            (self.ra, "ra"),
        ] {
            if bit {
                write!(f, " {}", name)?;
            }
        }
        writeln!(
            f,
            "; QUERY: {}, ANSWER: {}, AUTHORITY: {}, ADDITIONAL: {}",
            self.questions.len(),
            self.answers.len(),
            self.authorities.len(),
            self.additionals.len()
        )?;

        if !self.questions.is_empty() {
            f.write_str("\n;; QUESTION SECTION:\n")?;
            for question in &self.questions {
                writeln!(f, ";{}", question)?;
            }
        }
        for (title, rrs) in [
            ("ANSWER", &self.answers),
            ("AUTHORITY", &self.authorities),
            ("ADDITIONAL", &self.additionals),
        ] {
            if !rrs.is_empty() {
                write!(f, "\n;; {} SECTION:\n", title)?;
                for rr in rrs {
                    writeln!(f, "{}", rr)?;
                }
            }
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////
// ERRORS                                                             //
////////////////////////////////////////////////////////////////////////

/// An error signaling that a message could not be decoded.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Error {
    HeaderTooShort,
    InvalidQuestion(name::Error),
    InvalidRecord(name::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::HeaderTooShort => f.write_str("header too short"),
            Self::InvalidQuestion(err) => write!(f, "invalid question: {}", err),
            Self::InvalidRecord(err) => write!(f, "invalid record: {}", err),
        }
    }
}

impl std::error::Error for Error {}

/// An error signaling that a [`Message`] could not be encoded.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum EncodeError {
    /// The buffer was too small.
    Truncated,
    OpcodeOutOfRange(u8),
    RcodeOutOfRange(u8),
}

impl From<Truncated> for EncodeError {
    fn from(_: Truncated) -> Self {
        Self::Truncated
    }
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::Truncated => f.write_str("message does not fit into the buffer"),
            Self::OpcodeOutOfRange(value) => write!(f, "opcode {} does not fit in four bits", value),
            Self::RcodeOutOfRange(value) => write!(f, "RCODE {} does not fit in four bits", value),
        }
    }
}

impl std::error::Error for EncodeError {}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::Class;
    use crate::name::Name;
    use crate::rr::Type;

    /// This is a reply to a query for example.com. IN NS to a recursive
    /// server, made on January 7, 2022. Both NS records compress their
    /// owner, and the second also compresses part of its RDATA.
    const EXAMPLE_COM_NS_MESSAGE: &[u8] =
        b"\xe2\xd7\x81\x80\x00\x01\x00\x02\x00\x00\x00\x01\x07\x65\x78\x61\
          \x6d\x70\x6c\x65\x03\x63\x6f\x6d\x00\x00\x02\x00\x01\xc0\x0c\x00\
          \x02\x00\x01\x00\x01\x50\xa2\x00\x14\x01\x61\x0c\x69\x61\x6e\x61\
          \x2d\x73\x65\x72\x76\x65\x72\x73\x03\x6e\x65\x74\x00\xc0\x0c\x00\
          \x02\x00\x01\x00\x01\x50\xa2\x00\x04\x01\x62\xc0\x2b\x00\x00\x29\
          \x10\x00\x00\x00\x00\x00\x00\x00";

    fn sample_response() -> Message {
        let query = Message::begin_query(Question::new("www.example.".parse().unwrap(), Type::A));
        let mut response = Message::begin_response(&query);
        response.add_question(query.questions()[0].clone());
        response.add_answer("www.example. 300 IN A 192.0.2.1".parse().unwrap());
        response.add_authority(
            "example. 3600 IN SOA ns.example. admin.example. 1 2 3 4 5"
                .parse()
                .unwrap(),
        );
        response.add_additional("ns.example. 300 IN A 192.0.2.53".parse().unwrap());
        response
    }

    #[test]
    fn decodes_a_real_compressed_message() {
        let message = Message::decode(EXAMPLE_COM_NS_MESSAGE).unwrap();
        let qname: Name = "example.com.".parse().unwrap();
        let ns_a: Name = "a.iana-servers.net.".parse().unwrap();
        let ns_b: Name = "b.iana-servers.net.".parse().unwrap();

        assert_eq!(message.id(), 0xe2d7);
        assert!(message.is_response());
        assert_eq!(message.opcode(), Opcode::Query);
        assert!(!message.aa());
        assert!(!message.tc());
        assert!(message.rd());
        assert!(message.ra());
        assert_eq!(message.rcode(), Rcode::NoError);

        assert_eq!(message.questions(), [Question::new(qname.clone(), Type::Ns)]);
        assert_eq!(message.answers().len(), 2);
        for (rr, target) in message.answers().iter().zip([&ns_a, &ns_b]) {
            assert_eq!(rr.name(), &qname);
            assert_eq!(rr.rr_type(), Type::Ns);
            assert_eq!(rr.class(), Class::In);
            assert_eq!(rr.ttl(), 86178);
            assert_eq!(rr.rdata(), target.to_wire());
        }
        assert!(message.authorities().is_empty());

        let opt = &message.additionals()[0];
        assert!(opt.name().is_root());
        assert_eq!(u16::from(opt.rr_type()), 41);
        assert_eq!(opt.class(), Class::from(4096));
        assert!(opt.rdata().is_empty());
    }

    #[test]
    fn round_trips_through_the_wire_form() {
        let response = sample_response();
        let mut buf = [0; MAX_UDP_MESSAGE_SIZE];
        let len = response.encode(&mut buf).unwrap();
        let (decoded, decoded_len) = Message::decode_with_len(&buf[..len]).unwrap();
        assert_eq!(decoded, response);
        assert_eq!(decoded_len, len);
    }

    #[test]
    fn header_bits_are_where_rfc1035_puts_them() {
        let mut message = Message::default();
        message.set_id(0x1234);
        message.set_opcode(Opcode::Status);
        message.set_rcode(Rcode::NxDomain);
        message.set_rd(true);
        let mut buf = [0; HEADER_SIZE];
        assert_eq!(message.encode(&mut buf), Ok(HEADER_SIZE));
        assert_eq!(buf, *b"\x12\x34\x11\x03\x00\x00\x00\x00\x00\x00\x00\x00");

        // The whole opcode and RCODE survive decoding.
        let decoded = Message::decode(b"\x00\x00\xfd\x8f\x00\x00\x00\x00\x00\x00\x00\x00").unwrap();
        assert!(decoded.is_response());
        assert_eq!(decoded.opcode(), Opcode::Unassigned(15));
        assert!(decoded.aa() && !decoded.tc() && decoded.rd() && decoded.ra());
        assert_eq!(decoded.rcode(), Rcode::Unassigned(15));
    }

    #[test]
    fn begin_response_copies_the_right_fields() {
        let mut query = Message::begin_query(Question::new(Name::root(), Type::Soa));
        query.set_rd(true);
        query.set_opcode(Opcode::Notify);
        let response = Message::begin_response(&query);
        assert_eq!(response.id(), query.id());
        assert_eq!(response.opcode(), Opcode::Notify);
        assert!(response.is_response());
        assert!(response.aa());
        assert!(response.rd());
        assert!(!response.ra());
        assert!(response.questions().is_empty());
    }

    #[test]
    fn truncated_messages_never_decode() {
        let mut buf = [0; MAX_UDP_MESSAGE_SIZE];
        let len = sample_response().encode(&mut buf).unwrap();
        for end in 0..len {
            assert!(Message::decode(&buf[..end]).is_err(), "decoded {} octets", end);
        }
        for end in 0..EXAMPLE_COM_NS_MESSAGE.len() {
            assert!(Message::decode(&EXAMPLE_COM_NS_MESSAGE[..end]).is_err());
        }
    }

    #[test]
    fn short_headers_are_rejected() {
        for size in 0..HEADER_SIZE {
            let buf = vec![0; size];
            assert_eq!(Message::decode(&buf), Err(Error::HeaderTooShort));
        }
    }

    #[test]
    fn encode_fails_when_the_buffer_is_too_small() {
        let response = sample_response();
        let mut buf = [0; MAX_UDP_MESSAGE_SIZE];
        let len = response.encode(&mut buf).unwrap();
        assert_eq!(response.encode(&mut buf[..len - 1]), Err(EncodeError::Truncated));
    }

    #[test]
    fn every_four_bit_opcode_and_rcode_round_trips() {
        for value in 0..16 {
            let mut message = sample_response();
            message.set_opcode(Opcode::Unassigned(value));
            message.set_rcode(Rcode::Unassigned(value));
            assert_eq!(message.opcode(), Opcode::try_from(value).unwrap());
            assert_eq!(message.rcode(), Rcode::try_from(value).unwrap());

            let mut buf = [0; MAX_UDP_MESSAGE_SIZE];
            let len = message.encode(&mut buf).unwrap();
            assert_eq!(Message::decode(&buf[..len]).unwrap(), message);
        }
    }

    #[test]
    fn encode_rejects_values_wider_than_four_bits() {
        let mut buf = [0; MAX_UDP_MESSAGE_SIZE];
        let mut message = sample_response();
        message.set_opcode(Opcode::Unassigned(200));
        assert_eq!(message.encode(&mut buf), Err(EncodeError::OpcodeOutOfRange(200)));

        let mut message = sample_response();
        message.set_rcode(Rcode::Unassigned(16));
        assert_eq!(message.encode(&mut buf), Err(EncodeError::RcodeOutOfRange(16)));
    }

    #[test]
    fn displays_like_dig() {
        let text = sample_response().to_string();
        assert!(text.starts_with(";; ->>HEADER<<- opcode: QUERY, status: NOERROR, id: "));
        assert!(text.contains(";; flags: qr aa; QUERY: 1, ANSWER: 1, AUTHORITY: 1, ADDITIONAL: 1\n"));
        assert!(text.contains("\n;; QUESTION SECTION:\n;www.example."));
        assert!(text.contains("\n;; ANSWER SECTION:\nwww.example."));
        assert!(text.contains("\n;; AUTHORITY SECTION:\nexample."));
        assert!(text.contains("\n;; ADDITIONAL SECTION:\nns.example."));
    }
}
