use crate::error::{ArgError, DecodeError};
use bitvec::prelude::*;
use std::{fmt, str::FromStr};

/// Every TYPE and QTYPE this resolver knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    /// a host address
    A,
    /// an authoritative name server
    Ns,
    /// a mail destination (Obsolete - use MX)
    Md,
    /// a mail forwarder (Obsolete - use MX)
    Mf,
    /// the canonical name for an alias
    Cname,
    /// marks the start of a zone of authority
    Soa,
    /// a mailbox domain name (EXPERIMENTAL)
    Mb,
    /// a mail group member (EXPERIMENTAL)
    Mg,
    /// a mail rename domain name (EXPERIMENTAL)
    Mr,
    /// a null RR (EXPERIMENTAL)
    Null,
    /// a well known service description
    Wks,
    /// a domain name pointer
    Ptr,
    /// host information
    Hinfo,
    /// mailbox or mail list information
    Minfo,
    /// mail exchange
    Mx,
    /// text strings
    Txt,
    /// IPv6 address, RFC 3596
    Aaaa,
    /// service locator, RFC 2782
    Srv,
    /// HTTPS binding, RFC 9460
    Https,
    /// certification authority authorization, RFC 6844
    Caa,
    /// A request for a transfer of an entire zone
    Axfr,
    /// A request for mailbox-related records (MB, MG or MR)
    Mailb,
    /// A request for mail agent RRs (Obsolete - see MX)
    Maila,
    /// A request for all records
    All,
}

impl RecordType {
    pub const ALL_TYPES: [RecordType; 24] = [
        Self::A,
        Self::Ns,
        Self::Md,
        Self::Mf,
        Self::Cname,
        Self::Soa,
        Self::Mb,
        Self::Mg,
        Self::Mr,
        Self::Null,
        Self::Wks,
        Self::Ptr,
        Self::Hinfo,
        Self::Minfo,
        Self::Mx,
        Self::Txt,
        Self::Aaaa,
        Self::Srv,
        Self::Https,
        Self::Caa,
        Self::Axfr,
        Self::Mailb,
        Self::Maila,
        Self::All,
    ];

    /// The TYPE value used on the wire.
    pub fn code(self) -> u16 {
        match self {
            Self::A => 1,
            Self::Ns => 2,
            Self::Md => 3,
            Self::Mf => 4,
            Self::Cname => 5,
            Self::Soa => 6,
            Self::Mb => 7,
            Self::Mg => 8,
            Self::Mr => 9,
            Self::Null => 10,
            Self::Wks => 11,
            Self::Ptr => 12,
            Self::Hinfo => 13,
            Self::Minfo => 14,
            Self::Mx => 15,
            Self::Txt => 16,
            Self::Aaaa => 28,
            Self::Srv => 33,
            Self::Https => 65,
            Self::Caa => 257,
            Self::Axfr => 252,
            Self::Mailb => 253,
            Self::Maila => 254,
            Self::All => 255,
        }
    }

    /// QTYPEs may be asked for, but never show up as the type of a stored record.
    pub fn is_query_only(self) -> bool {
        matches!(self, Self::Axfr | Self::Mailb | Self::Maila | Self::All)
    }

    pub fn serialize<T: BitStore>(&self, bv: &mut BitVec<T, Msb0>) {
        bv.extend_from_bitslice(self.code().view_bits::<Msb0>())
    }
}

impl FromStr for RecordType {
    type Err = ArgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_uppercase();
        Self::ALL_TYPES
            .into_iter()
            .find(|rt| rt.to_string() == wanted)
            .ok_or_else(|| ArgError::UnknownType(s.to_owned()))
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::A => "A",
            Self::Ns => "NS",
            Self::Md => "MD",
            Self::Mf => "MF",
            Self::Cname => "CNAME",
            Self::Soa => "SOA",
            Self::Mb => "MB",
            Self::Mg => "MG",
            Self::Mr => "MR",
            Self::Null => "NULL",
            Self::Wks => "WKS",
            Self::Ptr => "PTR",
            Self::Hinfo => "HINFO",
            Self::Minfo => "MINFO",
            Self::Mx => "MX",
            Self::Txt => "TXT",
            Self::Aaaa => "AAAA",
            Self::Srv => "SRV",
            Self::Https => "HTTPS",
            Self::Caa => "CAA",
            Self::Axfr => "AXFR",
            Self::Mailb => "MAILB",
            Self::Maila => "MAILA",
            Self::All => "ALL",
        };
        s.fmt(f)
    }
}

impl TryFrom<u16> for RecordType {
    type Error = DecodeError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::ALL_TYPES
            .into_iter()
            .find(|rt| rt.code() == value)
            .ok_or(DecodeError::UnknownType(value))
    }
}

#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Class {
    /// the Internet
    #[default]
    IN,
    /// the CSNET class (Obsolete)
    CS,
    /// the CHAOS class
    CH,
    /// Hesiod
    HS,
    /// any class, only valid in questions
    ANY,
}

impl Class {
    pub fn code(self) -> u16 {
        match self {
            Self::IN => 1,
            Self::CS => 2,
            Self::CH => 3,
            Self::HS => 4,
            Self::ANY => 255,
        }
    }

    pub fn serialize<T: BitStore>(&self, bv: &mut BitVec<T, Msb0>) {
        bv.extend_from_bitslice(self.code().view_bits::<Msb0>())
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::IN => "IN",
            Self::CS => "CS",
            Self::CH => "CH",
            Self::HS => "HS",
            Self::ANY => "ANY",
        };
        s.fmt(f)
    }
}

impl FromStr for Class {
    type Err = ArgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let class = match s.trim().to_uppercase().as_str() {
            "IN" => Self::IN,
            "CS" => Self::CS,
            "CH" => Self::CH,
            "HS" => Self::HS,
            "ANY" => Self::ANY,
            _ => return Err(ArgError::UnknownClass(s.to_owned())),
        };
        Ok(class)
    }
}

impl TryFrom<u16> for Class {
    type Error = DecodeError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        let class = match value {
            1 => Self::IN,
            2 => Self::CS,
            3 => Self::CH,
            4 => Self::HS,
            255 => Self::ANY,
            other => return Err(DecodeError::UnknownClass(other)),
        };
        Ok(class)
    }
}
