//! Error types for every layer: wire decoding, query encoding, resolution and argument
//! validation.
use crate::dns_types::RecordType;
use thiserror::Error;

/// Why a response could not be turned into a [`Message`](crate::message::Message).
/// Decoding is all-or-nothing, so any of these aborts the whole message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("message ended early, needed more bytes at offset {offset}")]
    Truncated { offset: usize },

    #[error("label length byte {prefix:#04x} at offset {offset} uses a reserved prefix")]
    ReservedLabelPrefix { offset: usize, prefix: u8 },

    /// A compression pointer must point strictly before the labels it interrupts,
    /// otherwise following it may never end.
    #[error(
        "compression pointer at offset {offset} jumps to {target}, which is not earlier in the name"
    )]
    BadPointer { offset: usize, target: usize },

    #[error("label at offset {offset} is not ASCII")]
    NonAsciiLabel { offset: usize },

    #[error("unknown record type {0}")]
    UnknownType(u16),

    #[error("unknown class {0}")]
    UnknownClass(u16),

    #[error("unknown opcode {0}")]
    UnknownOpcode(u8),

    #[error("unknown response code {0}")]
    UnknownResponseCode(u8),

    #[error("{0} is only valid in questions, but appeared as record data")]
    QueryTypeInRecord(RecordType),

    #[error("{count} unexpected bytes after the last record, starting at offset {offset}")]
    TrailingBytes { offset: usize, count: usize },

    #[error(
        "RData was not read correctly. Expected position: {expected}; actual position: {actual}; type: {record_type}"
    )]
    RdataLength {
        record_type: RecordType,
        expected: usize,
        actual: usize,
    },
}

/// Why a message could not be serialized. The encoder only writes queries.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("encoding the {0} section is not supported")]
    UnsupportedSection(&'static str),

    #[error("{0} questions do not fit in the 16 bit question count")]
    TooManyQuestions(usize),

    #[error("domain name {0:?} is not ASCII")]
    NonAscii(String),

    #[error("domain name {0:?} has an empty label")]
    EmptyLabel(String),

    #[error("label {label:?} is {len} bytes, over the max of 63")]
    LabelTooLong { label: String, len: usize },

    #[error("domain name is {0} bytes on the wire, over the max of 255")]
    NameTooLong(usize),
}

/// Failures that abort a resolution. Names that simply could not be found are not errors,
/// see [`Outcome`](crate::resolver::Outcome).
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("could not build query: {0}")]
    Encode(#[from] EncodeError),

    #[error("could not parse response from {server}: {source}")]
    Decode {
        server: std::net::Ipv4Addr,
        #[source]
        source: DecodeError,
    },

    #[error("exchange with {server} failed: {source}")]
    Transport {
        server: std::net::Ipv4Addr,
        #[source]
        source: std::io::Error,
    },
}

/// Invalid input at the command line boundary.
#[derive(Error, Debug)]
pub enum ArgError {
    #[error("Unknown type: {0}")]
    UnknownType(String),

    #[error("Unknown class: {0}")]
    UnknownClass(String),

    #[error("{0} is not provided")]
    MissingArgument(String),

    #[error("Unknown root server: {0}")]
    UnknownRootServer(String),

    #[error("Bad IPv4 address: {0}")]
    BadIpv4(String),

    #[error("Unknown argument: {0}")]
    UnexpectedArgument(String),

    #[error(transparent)]
    Cli(pico_args::Error),
}

impl From<pico_args::Error> for ArgError {
    fn from(e: pico_args::Error) -> Self {
        match e {
            pico_args::Error::OptionWithoutAValue(key) => Self::MissingArgument(key.to_owned()),
            pico_args::Error::MissingArgument => Self::MissingArgument("Domain name".to_owned()),
            other => Self::Cli(other),
        }
    }
}
