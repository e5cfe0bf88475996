use crate::{error::DecodeError, message::parser_utils::*, parse::WireError};
use bitvec::prelude::*;
use nom::{combinator::map_res, IResult};

/// RFC 1035 defines DNS headers as 12 bytes long.
pub(crate) const EXPECTED_SIZE_BYTES: usize = 12;

/// All DNS messages start with a Header (both queries and responses!)
/// Structure is defined at <https://datatracker.ietf.org/doc/html/rfc1035#section-4.1.1>
///
/// The four section counts are not kept here. When decoding they are returned alongside
/// the header in [`SectionCounts`], when encoding they come from the message's sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// A 16 bit identifier assigned by the program that generates any kind of query.  This identifier is copied the corresponding reply and can be used by the requester to match up replies to outstanding queries.
    pub id: u16,
    pub qr: Qr,
    /// A four bit field that specifies kind of query in this message.  This value is set by the originator of a query and copied into the response.
    pub opcode: Opcode,
    /// Valid in responses, and specifies that the responding name server is an authority for the domain name in question section.
    pub authoritative_answer: bool,
    /// Specifies that this message was truncated due to length greater than that permitted on the transmission channel.
    pub truncation: bool,
    /// If RD is set, it directs the name server to pursue the query recursively.
    pub recursion_desired: bool,
    /// Set or cleared in a response, and denotes whether recursive query support is available in the name server.
    pub recursion_available: bool,
    pub response_code: ResponseCode,
}

/// How many entries each section of a decoded message declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SectionCounts {
    pub question: u16,
    pub answer: u16,
    pub authority: u16,
    pub additional: u16,
}

impl Header {
    /// Header for a standard query. Recursion is not requested, because the resolver walks
    /// the referrals itself.
    pub fn new_query(id: u16) -> Self {
        Self {
            id,
            qr: Qr::Query,
            opcode: Opcode::StandardQuery,
            authoritative_answer: false,
            truncation: false,
            recursion_desired: false,
            recursion_available: false,
            response_code: ResponseCode::NoError, // This doesn't matter for a query
        }
    }

    /// Serialize the Header and write it into the stream of bits.
    pub fn serialize(&self, bv: &mut BitVec<u8, Msb0>, counts: SectionCounts) {
        let initial_length_bits = bv.len();
        bv.extend_from_bitslice(self.id.view_bits::<Msb0>());
        bv.push(self.qr == Qr::Response);
        push_nibble(bv, self.opcode as u8);
        bv.push(self.authoritative_answer);
        bv.push(self.truncation);
        bv.push(self.recursion_desired);
        bv.push(self.recursion_available);
        // the Z field, reserved for future use.
        bv.extend_from_bitslice(bits![u8, Msb0; 0; 3]);
        push_nibble(bv, self.response_code as u8);
        for count in [
            counts.question,
            counts.answer,
            counts.authority,
            counts.additional,
        ] {
            bv.extend_from_bitslice(count.view_bits::<Msb0>());
        }
        debug_assert_eq!(bv.len() - initial_length_bits, 8 * EXPECTED_SIZE_BYTES);
    }

    pub fn deserialize(i: BitInput) -> IResult<BitInput, (Self, SectionCounts), WireError> {
        // From RFC 1035, section 4.1.1
        // The header contains the following fields:
        //
        //                               1  1  1  1  1  1
        // 0  1  2  3  4  5  6  7  8  9  0  1  2  3  4  5
        // +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
        // |                      ID                       |
        // +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
        // |QR|   Opcode  |AA|TC|RD|RA|   Z    |   RCODE   |
        // +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
        // |                    QDCOUNT                    |
        // +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
        // |                    ANCOUNT                    |
        // +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
        // |                    NSCOUNT                    |
        // +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
        // |                    ARCOUNT                    |
        // +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
        let (i, id) = take_u16(i)?;
        let (i, qr) = take_bit(i)?;
        let (i, opcode) = map_res(take_nibble, Opcode::try_from)(i)?;
        let (i, aa) = take_bit(i)?;
        let (i, tc) = take_bit(i)?;
        let (i, rd) = take_bit(i)?;
        let (i, ra) = take_bit(i)?;
        // Z is ignored rather than checked.
        let (i, ()) = skip_bits(i, 3)?;
        let (i, rcode) = map_res(take_nibble, ResponseCode::try_from)(i)?;
        let (i, question) = take_u16(i)?;
        let (i, answer) = take_u16(i)?;
        let (i, authority) = take_u16(i)?;
        let (i, additional) = take_u16(i)?;
        let header = Header {
            id,
            qr: if qr { Qr::Response } else { Qr::Query },
            opcode,
            authoritative_answer: aa,
            truncation: tc,
            recursion_desired: rd,
            recursion_available: ra,
            response_code: rcode,
        };
        let counts = SectionCounts {
            question,
            answer,
            authority,
            additional,
        };
        Ok((i, (header, counts)))
    }
}

/// Write the low 4 bits of `value`.
fn push_nibble(bv: &mut BitVec<u8, Msb0>, value: u8) {
    bv.extend_from_bitslice(&value.view_bits::<Msb0>()[4..]);
}

/// A one bit field that specifies whether this message is a query (0), or a response (1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Qr {
    Query,
    Response,
}

/// A four bit field that specifies kind of query in this message.
/// This value is set by the originator of a query and copied into the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    /// 0: a standard query (QUERY)
    StandardQuery = 0,
    /// 1: an inverse query (IQUERY)
    InverseQuery = 1,
    /// 2: a server status request (STATUS)
    ServerStatusRequest = 2,
}

impl TryFrom<u8> for Opcode {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        let op = match value {
            0 => Self::StandardQuery,
            1 => Self::InverseQuery,
            2 => Self::ServerStatusRequest,
            other => return Err(DecodeError::UnknownOpcode(other)),
        };
        Ok(op)
    }
}

/// This field is set by the name server and indicates if the DNS query was successful or erroneous.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseCode {
    NoError = 0,
    /// The name server was unable to interpret the query
    FormatError = 1,
    /// The name server was unable to process this query due to a problem with the name server.
    ServerFailure = 2,
    /// Meaningful only for responses from an authoritative name server, this code signifies
    /// that the domain name referenced in the query does not exist.
    NameError = 3,
    /// The name server does not support the requested kind of query.
    NotImplemented = 4,
    /// The name server refuses to perform the specified operation for policy reasons.
    Refused = 5,
}

impl std::fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::NoError => "No error condition",
            Self::FormatError => "The name server was unable to interpret the query",
            Self::ServerFailure => "The name server was unable to process this query due to a problem with the name server",
            Self::NameError => "Domain name referenced in the query does not exist",
            Self::NotImplemented => "The name server does not support the requested kind of query",
            Self::Refused => "The name server refuses to perform the specified operation for policy reasons",
        };
        s.fmt(f)
    }
}

impl TryFrom<u8> for ResponseCode {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        let rcode = match value {
            0 => Self::NoError,
            1 => Self::FormatError,
            2 => Self::ServerFailure,
            3 => Self::NameError,
            4 => Self::NotImplemented,
            5 => Self::Refused,
            other => return Err(DecodeError::UnknownResponseCode(other)),
        };
        Ok(rcode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deser(i: &[u8]) -> IResult<&[u8], (Header, SectionCounts), WireError> {
        nom::bits::bits(Header::deserialize)(i)
    }

    #[test]
    fn test_serialize_header_for_query() {
        let h = Header::new_query(12354);
        let mut bv = BitVec::<u8, Msb0>::new();
        let counts = SectionCounts {
            question: 1,
            ..Default::default()
        };
        h.serialize(&mut bv, counts);
        assert_eq!(
            bv.into_vec(),
            vec![0x30, 0x42, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0]
        );
    }

    #[test]
    fn test_serialize_flag_positions() {
        let h = Header {
            id: 0,
            qr: Qr::Response,
            opcode: Opcode::ServerStatusRequest,
            authoritative_answer: true,
            truncation: false,
            recursion_desired: true,
            recursion_available: true,
            response_code: ResponseCode::Refused,
        };
        let mut bv = BitVec::<u8, Msb0>::new();
        h.serialize(&mut bv, SectionCounts::default());
        let bytes = bv.into_vec();
        // QR=1 Opcode=0010 AA=1 TC=0 RD=1 | RA=1 Z=000 RCODE=0101
        assert_eq!(&bytes[2..4], &[0b1001_0101, 0b1000_0101]);
    }

    #[test]
    fn test_deserialize() {
        // This is a real response from a DNS resolver (1.1.1.1)
        let i = vec![
            0, 33, 128, 130, 0, 1, 0, 0, 0, 0, 0, 0, 4, 98, 108, 111, 103, 12, 97, 100, 97, 109,
            99, 104, 97, 108, 109, 101, 114, 115, 3, 99, 111, 109, 0, 0, 1, 0, 1,
        ];
        let (rest, (h, counts)) = deser(&i).unwrap();
        assert_eq!(rest.len(), i.len() - EXPECTED_SIZE_BYTES);
        assert_eq!(h.id, 33);
        assert_eq!(h.qr, Qr::Response);
        assert_eq!(h.opcode, Opcode::StandardQuery);
        assert!(!h.recursion_desired);
        assert_eq!(h.response_code, ResponseCode::ServerFailure);
        assert_eq!(counts.question, 1);
        assert_eq!(counts.answer, 0);
    }

    #[test]
    fn test_reserved_z_bits_are_ignored() {
        let i = [0, 1, 0b1000_0000, 0b0111_0011, 0, 0, 0, 0, 0, 0, 0, 0];
        let (_, (h, _)) = deser(&i).unwrap();
        assert_eq!(h.response_code, ResponseCode::NameError);
    }

    fn deser_err(i: &[u8]) -> DecodeError {
        match deser(i) {
            Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => e.into_decode_error(i.len()),
            other => panic!("expected a decode error, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_opcode_and_rcode() {
        let bad_opcode = [0, 1, 0b0001_1000, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        assert_eq!(deser_err(&bad_opcode), DecodeError::UnknownOpcode(3));

        let bad_rcode = [0, 1, 0, 0b0000_0110, 0, 0, 0, 0, 0, 0, 0, 0];
        assert_eq!(deser_err(&bad_rcode), DecodeError::UnknownResponseCode(6));
    }

    #[test]
    fn test_short_header() {
        assert!(matches!(
            deser_err(&[0, 1, 0, 0, 0]),
            DecodeError::Truncated { .. }
        ));
    }
}
