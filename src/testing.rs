//! Hand-assembles responses for tests. The real encoder only writes queries, so records
//! are built byte by byte here.
use crate::{dns_types::RecordType, message::name::serialize_name};
use bitvec::prelude::*;
use std::net::Ipv4Addr;

pub const TTL: u32 = 3600;

pub fn wire_name(name: &str) -> Vec<u8> {
    let mut bv = BitVec::<u8, Msb0>::new();
    serialize_name(name, &mut bv).unwrap();
    bv.into_vec()
}

/// A class IN record whose RDLENGTH is `rdlength`, regardless of how long `rdata` is.
pub fn rr_with_len(owner: &[u8], rtype: u16, rdata: &[u8], rdlength: u16) -> Vec<u8> {
    let mut out = owner.to_vec();
    out.extend_from_slice(&rtype.to_be_bytes());
    out.extend_from_slice(&1u16.to_be_bytes());
    out.extend_from_slice(&TTL.to_be_bytes());
    out.extend_from_slice(&rdlength.to_be_bytes());
    out.extend_from_slice(rdata);
    out
}

pub fn rr(owner: &str, rtype: RecordType, rdata: &[u8]) -> Vec<u8> {
    rr_with_len(
        &wire_name(owner),
        rtype.code(),
        rdata,
        rdata.len() as u16,
    )
}

pub fn a(owner: &str, ip: Ipv4Addr) -> Vec<u8> {
    rr(owner, RecordType::A, &ip.octets())
}

pub fn ns(owner: &str, target: &str) -> Vec<u8> {
    rr(owner, RecordType::Ns, &wire_name(target))
}

pub fn cname(owner: &str, target: &str) -> Vec<u8> {
    rr(owner, RecordType::Cname, &wire_name(target))
}

/// Builds a response with one question and whatever records are added to it.
pub struct ResponseBuilder {
    id: u16,
    rcode: u8,
    question: Vec<u8>,
    answer: Vec<Vec<u8>>,
    authority: Vec<Vec<u8>>,
    additional: Vec<Vec<u8>>,
}

impl ResponseBuilder {
    pub fn new(id: u16, qname: &str, qtype: RecordType) -> Self {
        let mut question = wire_name(qname);
        question.extend_from_slice(&qtype.code().to_be_bytes());
        question.extend_from_slice(&1u16.to_be_bytes());
        Self {
            id,
            rcode: 0,
            question,
            answer: Vec::new(),
            authority: Vec::new(),
            additional: Vec::new(),
        }
    }

    pub fn rcode(mut self, rcode: u8) -> Self {
        self.rcode = rcode;
        self
    }

    pub fn answer(mut self, record: Vec<u8>) -> Self {
        self.answer.push(record);
        self
    }

    pub fn authority(mut self, record: Vec<u8>) -> Self {
        self.authority.push(record);
        self
    }

    pub fn additional(mut self, record: Vec<u8>) -> Self {
        self.additional.push(record);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&self.id.to_be_bytes());
        // QR=1, everything else zero apart from RCODE.
        out.push(0b1000_0000);
        out.push(self.rcode & 0x0F);
        for count in [1, self.answer.len(), self.authority.len(), self.additional.len()] {
            out.extend_from_slice(&(count as u16).to_be_bytes());
        }
        out.extend_from_slice(&self.question);
        for record in self
            .answer
            .iter()
            .chain(&self.authority)
            .chain(&self.additional)
        {
            out.extend_from_slice(record);
        }
        out
    }
}
