use crate::dns_types::{Class, RecordType};
use std::{
    fmt,
    net::{Ipv4Addr, Ipv6Addr},
};

/// A resource record from the answer, authority or additional section.
///
/// There is no separate type field: the type is whatever [`RecordData`] variant the record
/// holds, so the two can never disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub name: String,
    pub class: Class,
    /// Seconds the record may be cached for.
    pub ttl: u32,
    pub data: RecordData,
}

impl Record {
    pub fn record_type(&self) -> RecordType {
        self.data.record_type()
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<32}{:<8}{:<8}{}",
            self.name,
            self.record_type().to_string(),
            self.class.to_string(),
            self.data
        )
    }
}

/// The RDATA of a record, one variant per record type that can be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordData {
    A(Ipv4Addr),
    /// A host which should be authoritative for the owner's zone.
    Ns(String),
    /// A host with a mail agent able to deliver mail for the domain. Obsolete.
    Md(String),
    /// A host with a mail agent that will forward mail for the domain. Obsolete.
    Mf(String),
    /// The canonical name for the owner, which is an alias.
    Cname(String),
    Soa {
        /// The name server that was the original or primary source of data for this zone.
        mname: String,
        /// The mailbox of the person responsible for this zone.
        rname: String,
        serial: u32,
        refresh: u32,
        retry: u32,
        expire: u32,
        minimum: u32,
    },
    Mb(String),
    Mg(String),
    Mr(String),
    Null(Vec<u8>),
    Wks {
        address: Ipv4Addr,
        /// An IP protocol number.
        protocol: u8,
        /// One bit per port.
        bitmap: Vec<u8>,
    },
    Ptr(String),
    Hinfo {
        cpu: String,
        os: String,
    },
    Minfo {
        rmailbx: String,
        emailbx: String,
    },
    Mx {
        preference: u16,
        exchange: String,
    },
    Txt(Vec<String>),
    Aaaa(Ipv6Addr),
    Srv {
        priority: u16,
        weight: u16,
        port: u16,
        target: String,
    },
    Https {
        priority: u16,
        target: String,
        /// SvcParams as (key, value), in wire order.
        params: Vec<(u16, String)>,
    },
    Caa {
        flags: u8,
        tag: String,
        value: Vec<u8>,
    },
}

impl RecordData {
    pub fn record_type(&self) -> RecordType {
        match self {
            Self::A(_) => RecordType::A,
            Self::Ns(_) => RecordType::Ns,
            Self::Md(_) => RecordType::Md,
            Self::Mf(_) => RecordType::Mf,
            Self::Cname(_) => RecordType::Cname,
            Self::Soa { .. } => RecordType::Soa,
            Self::Mb(_) => RecordType::Mb,
            Self::Mg(_) => RecordType::Mg,
            Self::Mr(_) => RecordType::Mr,
            Self::Null(_) => RecordType::Null,
            Self::Wks { .. } => RecordType::Wks,
            Self::Ptr(_) => RecordType::Ptr,
            Self::Hinfo { .. } => RecordType::Hinfo,
            Self::Minfo { .. } => RecordType::Minfo,
            Self::Mx { .. } => RecordType::Mx,
            Self::Txt(_) => RecordType::Txt,
            Self::Aaaa(_) => RecordType::Aaaa,
            Self::Srv { .. } => RecordType::Srv,
            Self::Https { .. } => RecordType::Https,
            Self::Caa { .. } => RecordType::Caa,
        }
    }
}

impl fmt::Display for RecordData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A(ip) => write!(f, "{ip}"),
            Self::Aaaa(ip) => write!(f, "{ip}"),
            Self::Ns(name)
            | Self::Md(name)
            | Self::Mf(name)
            | Self::Cname(name)
            | Self::Mb(name)
            | Self::Mg(name)
            | Self::Mr(name)
            | Self::Ptr(name) => write!(f, "{name}"),
            Self::Soa {
                mname,
                rname,
                serial,
                refresh,
                retry,
                expire,
                minimum,
            } => write!(
                f,
                "{mname} {rname} {serial} {refresh} {retry} {expire} {minimum}"
            ),
            Self::Null(raw) => write!(f, "{} bytes", raw.len()),
            Self::Wks {
                address, protocol, ..
            } => write!(f, "{address} {protocol}"),
            Self::Hinfo { cpu, os } => write!(f, "{cpu:?} {os:?}"),
            Self::Minfo { rmailbx, emailbx } => write!(f, "{rmailbx} {emailbx}"),
            Self::Mx {
                preference,
                exchange,
            } => write!(f, "{preference} {exchange}"),
            Self::Txt(texts) => {
                let quoted: Vec<_> = texts.iter().map(|t| format!("{t:?}")).collect();
                write!(f, "{}", quoted.join(" "))
            }
            Self::Srv {
                priority,
                weight,
                port,
                target,
            } => write!(f, "{priority} {weight} {port} {target}"),
            Self::Https {
                priority,
                target,
                params,
            } => {
                write!(f, "{priority} {target}")?;
                for (key, value) in params {
                    write!(f, " key{key}={value:?}")?;
                }
                Ok(())
            }
            Self::Caa { flags, tag, value } => {
                write!(f, "{flags} {tag} {:?}", String::from_utf8_lossy(value))
            }
        }
    }
}
