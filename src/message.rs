pub mod header;
pub mod name;
pub(crate) mod parser_utils;
pub mod question;
pub mod record;

use crate::{
    dns_types::{Class, RecordType},
    error::{DecodeError, EncodeError},
    parse::{character_string, length_prefixed, long_string, offset, WireError},
    util::ascii_lossy,
};
use bitvec::prelude::*;
use header::{Header, SectionCounts};
use nom::{
    bytes::complete::take,
    combinator::{map, map_res},
    multi::count,
    number::complete::{be_u128, be_u16, be_u32, be_u8},
    sequence::tuple,
    IResult, Parser,
};
use question::Question;
use record::{Record, RecordData};
use std::net::{Ipv4Addr, Ipv6Addr};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// The header section is always present.  The header includes fields that
    /// specify which of the remaining sections are present, and also specify
    /// whether the message is a query or a response, a standard query or some
    /// other opcode, etc.
    pub header: Header,
    // The question section contains fields that describe a
    // question to a name server.  These fields are a query type (QTYPE), a
    // query class (QCLASS), and a query domain name (QNAME).
    pub question: Vec<Question>,
    // The last three
    // sections have the same format: a possibly empty list of concatenated
    // resource records (RRs).
    /// The answer section contains RRs that answer the question
    pub answer: Vec<Record>,
    /// the authority section contains RRs that point toward an
    /// authoritative name server;
    pub authority: Vec<Record>,
    /// the additional records section contains RRs
    /// which relate to the query, but are not strictly answers for the
    /// question.
    pub additional: Vec<Record>,
}

impl Message {
    pub fn new_query(id: u16, question: Question) -> Self {
        Message {
            header: Header::new_query(id),
            question: vec![question],
            answer: Vec::new(),
            authority: Vec::new(),
            additional: Vec::new(),
        }
    }

    /// Encode a query. Only the header and question section can be written; a message with
    /// any records in it is refused rather than silently truncated.
    pub fn serialize_bytes(&self) -> Result<Vec<u8>, EncodeError> {
        for (section, records) in [
            ("answer", &self.answer),
            ("authority", &self.authority),
            ("additional", &self.additional),
        ] {
            if !records.is_empty() {
                return Err(EncodeError::UnsupportedSection(section));
            }
        }
        let question_count = u16::try_from(self.question.len())
            .map_err(|_| EncodeError::TooManyQuestions(self.question.len()))?;
        let counts = SectionCounts {
            question: question_count,
            ..Default::default()
        };

        let mut bv = BitVec::<u8, Msb0>::new();
        self.header.serialize(&mut bv, counts);
        for q in &self.question {
            q.serialize(&mut bv)?;
        }
        Ok(bv.into_vec())
    }

    /// Decode a whole message. Either every section parses, or nothing is returned.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        match Self::deserialize(bytes) {
            Ok(([], msg)) => Ok(msg),
            Ok((rest, _)) => Err(DecodeError::TrailingBytes {
                offset: offset(bytes, rest),
                count: rest.len(),
            }),
            Err(nom::Err::Error(e) | nom::Err::Failure(e)) => {
                Err(e.into_decode_error(bytes.len()))
            }
            Err(nom::Err::Incomplete(_)) => Err(DecodeError::Truncated {
                offset: bytes.len(),
            }),
        }
    }

    /// Parse a message from the start of `message`, returning whatever follows it.
    pub fn deserialize(message: &[u8]) -> IResult<&[u8], Self, WireError> {
        let (i, (header, counts)) =
            nom::bits::bits::<_, _, WireError, WireError, _>(Header::deserialize)(message)?;

        // Each section holds exactly as many entries as the header says.
        let (i, question) = count(
            |i| Question::deserialize(message, i),
            counts.question.into(),
        )(i)?;
        let mut rp = RecordParser { message };
        let (i, answer) = count(|i| rp.parse(i), counts.answer.into())(i)?;
        let (i, authority) = count(|i| rp.parse(i), counts.authority.into())(i)?;
        let (i, additional) = count(|i| rp.parse(i), counts.additional.into())(i)?;
        Ok((
            i,
            Message {
                header,
                question,
                answer,
                authority,
                additional,
            },
        ))
    }
}

/// Parses resource records out of one message. Holds the whole message so that names can
/// follow compression pointers, and so that positions can be reported as offsets.
#[derive(Debug, Clone, Copy)]
pub struct RecordParser<'m> {
    message: &'m [u8],
}

impl<'m> RecordParser<'m> {
    fn offset(&self, rest: &[u8]) -> usize {
        offset(self.message, rest)
    }

    fn parse_name(&self, i: &'m [u8]) -> IResult<&'m [u8], String, WireError> {
        name::parse_name(self.message, i)
    }

    /// Everything from `i` up to the end of the RDATA.
    fn rest_of_rdata(&self, i: &'m [u8], end: usize) -> IResult<&'m [u8], Vec<u8>, WireError> {
        let len = end.saturating_sub(self.offset(i));
        map(take(len), <[u8]>::to_vec)(i)
    }

    /// Parse the RDATA of a `record_type` record that should finish at offset `end`.
    /// Variable-length payloads stop at `end`; fixed ones ignore it and the caller checks
    /// that they landed on it.
    fn parse_rdata(
        &self,
        record_type: RecordType,
        i: &'m [u8],
        end: usize,
    ) -> IResult<&'m [u8], RecordData, WireError> {
        let name = |i: &'m [u8]| self.parse_name(i);
        let parsed = match record_type {
            RecordType::A => map(ipv4, RecordData::A)(i)?,
            RecordType::Ns => map(name, RecordData::Ns)(i)?,
            RecordType::Md => map(name, RecordData::Md)(i)?,
            RecordType::Mf => map(name, RecordData::Mf)(i)?,
            RecordType::Cname => map(name, RecordData::Cname)(i)?,
            RecordType::Soa => map(
                tuple((name, name, be_u32, be_u32, be_u32, be_u32, be_u32)),
                |(mname, rname, serial, refresh, retry, expire, minimum)| RecordData::Soa {
                    mname,
                    rname,
                    serial,
                    refresh,
                    retry,
                    expire,
                    minimum,
                },
            )(i)?,
            RecordType::Mb => map(name, RecordData::Mb)(i)?,
            RecordType::Mg => map(name, RecordData::Mg)(i)?,
            RecordType::Mr => map(name, RecordData::Mr)(i)?,
            RecordType::Null => {
                map(|i: &'m [u8]| self.rest_of_rdata(i, end), RecordData::Null)(i)?
            }
            RecordType::Wks => {
                let (i, (address, protocol)) = tuple((ipv4, be_u8))(i)?;
                let (i, bitmap) = self.rest_of_rdata(i, end)?;
                (
                    i,
                    RecordData::Wks {
                        address,
                        protocol,
                        bitmap,
                    },
                )
            }
            RecordType::Ptr => map(name, RecordData::Ptr)(i)?,
            RecordType::Hinfo => map(
                tuple((character_string, character_string)),
                |(cpu, os)| RecordData::Hinfo { cpu, os },
            )(i)?,
            RecordType::Minfo => map(tuple((name, name)), |(rmailbx, emailbx)| {
                RecordData::Minfo { rmailbx, emailbx }
            })(i)?,
            RecordType::Mx => map(tuple((be_u16, name)), |(preference, exchange)| {
                RecordData::Mx {
                    preference,
                    exchange,
                }
            })(i)?,
            RecordType::Txt => {
                let mut texts = Vec::new();
                let mut i = i;
                while self.offset(i) < end {
                    let (rest, text) = character_string(i)?;
                    texts.push(text);
                    i = rest;
                }
                (i, RecordData::Txt(texts))
            }
            RecordType::Aaaa => map(be_u128, |bits| RecordData::Aaaa(Ipv6Addr::from(bits)))(i)?,
            RecordType::Srv => map(
                tuple((be_u16, be_u16, be_u16, name)),
                |(priority, weight, port, target)| RecordData::Srv {
                    priority,
                    weight,
                    port,
                    target,
                },
            )(i)?,
            RecordType::Https => {
                let (mut i, (priority, target)) = tuple((be_u16, name))(i)?;
                let mut params = Vec::new();
                while self.offset(i) < end {
                    let (rest, param) = tuple((be_u16, long_string))(i)?;
                    params.push(param);
                    i = rest;
                }
                (
                    i,
                    RecordData::Https {
                        priority,
                        target,
                        params,
                    },
                )
            }
            RecordType::Caa => {
                let (i, (flags, tag)) =
                    tuple((be_u8, map(length_prefixed(be_u8), ascii_lossy)))(i)?;
                let (i, value) = self.rest_of_rdata(i, end)?;
                (i, RecordData::Caa { flags, tag, value })
            }
            qtype => {
                debug_assert!(qtype.is_query_only());
                return Err(WireError::fail(i, DecodeError::QueryTypeInRecord(qtype)));
            }
        };
        Ok(parsed)
    }
}

impl<'m> Parser<&'m [u8], Record, WireError> for RecordParser<'m> {
    fn parse(&mut self, input: &'m [u8]) -> IResult<&'m [u8], Record, WireError> {
        let (input, name) = self.parse_name(input)?;
        let (input, record_type) = map_res(be_u16, RecordType::try_from)(input)?;
        let (input, class) = map_res(be_u16, Class::try_from)(input)?;
        let (input, ttl) = be_u32(input)?;
        let (input, rdlength) = be_u16(input)?;
        let end = self.offset(input) + usize::from(rdlength);
        let (input, data) = self.parse_rdata(record_type, input, end)?;
        let actual = self.offset(input);
        if actual != end {
            return Err(WireError::fail(
                input,
                DecodeError::RdataLength {
                    record_type,
                    expected: end,
                    actual,
                },
            ));
        }
        Ok((
            input,
            Record {
                name,
                class,
                ttl,
                data,
            },
        ))
    }
}

fn ipv4(i: &[u8]) -> IResult<&[u8], Ipv4Addr, WireError> {
    map(tuple((be_u8, be_u8, be_u8, be_u8)), |(a, b, c, d)| {
        Ipv4Addr::new(a, b, c, d)
    })(i)
}
