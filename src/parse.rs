use crate::{error::DecodeError, message::parser_utils::BitInput, util::ascii_lossy};
use nom::{
    bytes::complete::take,
    combinator::map,
    error::{ErrorKind, FromExternalError, ParseError},
    number::complete::{be_u16, be_u8},
    IResult, Parser, ToUsize,
};

/// Error type threaded through all the nom parsers.
///
/// nom only ever hands the *remaining* input to an error, so this keeps how many bytes were
/// left when parsing failed. Once the full message length is known,
/// [`WireError::into_decode_error`] turns that into an offset.
#[derive(Debug, PartialEq, Eq)]
pub struct WireError {
    remaining: usize,
    reason: Option<DecodeError>,
}

impl WireError {
    pub fn new(rest: &[u8], reason: DecodeError) -> Self {
        Self {
            remaining: rest.len(),
            reason: Some(reason),
        }
    }

    /// A failure that stops parsing immediately.
    pub fn fail(rest: &[u8], reason: DecodeError) -> nom::Err<Self> {
        nom::Err::Failure(Self::new(rest, reason))
    }

    pub fn into_decode_error(self, message_len: usize) -> DecodeError {
        // nom's own parsers only fail when they run out of bytes.
        self.reason.unwrap_or(DecodeError::Truncated {
            offset: message_len.saturating_sub(self.remaining),
        })
    }
}

impl<'i> ParseError<&'i [u8]> for WireError {
    fn from_error_kind(input: &'i [u8], _kind: ErrorKind) -> Self {
        Self {
            remaining: input.len(),
            reason: None,
        }
    }

    fn append(_input: &'i [u8], _kind: ErrorKind, other: Self) -> Self {
        other
    }
}

impl<'i> ParseError<BitInput<'i>> for WireError {
    fn from_error_kind((input, _bit): BitInput<'i>, _kind: ErrorKind) -> Self {
        Self {
            remaining: input.len(),
            reason: None,
        }
    }

    fn append(_input: BitInput<'i>, _kind: ErrorKind, other: Self) -> Self {
        other
    }
}

impl<'i> FromExternalError<&'i [u8], DecodeError> for WireError {
    fn from_external_error(input: &'i [u8], _kind: ErrorKind, e: DecodeError) -> Self {
        Self::new(input, e)
    }
}

impl<'i> FromExternalError<BitInput<'i>, DecodeError> for WireError {
    fn from_external_error((input, _bit): BitInput<'i>, _kind: ErrorKind, e: DecodeError) -> Self {
        Self::new(input, e)
    }
}

/// Lets `nom::bits::bits` hand bit-level errors back to the byte-level parsers unchanged.
impl nom::ErrorConvert<WireError> for WireError {
    fn convert(self) -> WireError {
        self
    }
}

/// How far into `message` the parser has got, given what is left of it.
pub fn offset(message: &[u8], rest: &[u8]) -> usize {
    message.len() - rest.len()
}

/// Read a length with `len`, then that many bytes. Unlike `nom::multi::length_data`, running
/// out of input is an error at the point where the bytes ran short, not `Incomplete`.
pub fn length_prefixed<'i, N, F>(
    mut len: F,
) -> impl FnMut(&'i [u8]) -> IResult<&'i [u8], &'i [u8], WireError>
where
    N: ToUsize,
    F: Parser<&'i [u8], N, WireError>,
{
    move |i| {
        let (i, n) = len.parse(i)?;
        take(n)(i)
    }
}

/// A <character-string>: one length byte, then that many bytes of text.
pub fn character_string(i: &[u8]) -> IResult<&[u8], String, WireError> {
    map(length_prefixed(be_u8), ascii_lossy)(i)
}

/// Like a <character-string>, but with a two byte length, as SvcParam values use.
pub fn long_string(i: &[u8]) -> IResult<&[u8], String, WireError> {
    map(length_prefixed(be_u16), ascii_lossy)(i)
}
