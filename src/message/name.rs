//! Domain names on the wire: a run of length-prefixed labels ending in a zero byte, where
//! any suffix may be replaced by a pointer back to an earlier copy of it.
//! See RFC 1035 sections 3.1 and 4.1.4.
use crate::{
    error::{DecodeError, EncodeError},
    parse::{length_prefixed, offset, WireError},
    util::join_asciis,
};
use ascii::{AsciiChar, AsciiStr, AsciiString};
use bitvec::prelude::*;
use nom::{number::complete::be_u8, IResult};

/// RFC 1035 section 2.3.4: labels are 63 octets or less.
pub const MAX_LABEL_BYTES: usize = 63;

/// RFC 1035 section 2.3.4: names are 255 octets or less.
pub const MAX_NAME_BYTES: usize = 255;

/// Top two bits of a length byte.
const LABEL: u8 = 0b00;
const POINTER: u8 = 0b11;

/// Parse the name starting at `input`, which must be a suffix of `message` so that
/// compression pointers can be followed.
///
/// Returns the rest of the input after the name as it appears in place: right after the
/// zero byte, or right after the first pointer if there was one.
pub fn parse_name<'m>(message: &'m [u8], input: &'m [u8]) -> IResult<&'m [u8], String, WireError> {
    let mut labels = Vec::new();
    let mut cursor = input;
    let mut resume = None;
    // Pointers must land strictly before the labels currently being read. Each jump lowers
    // this, so a chain of pointers can't loop.
    let mut limit = offset(message, input);
    loop {
        let (rest, len) = be_u8(cursor)?;
        match len >> 6 {
            LABEL if len == 0 => {
                cursor = rest;
                break;
            }
            LABEL => {
                let (rest, label) = parse_label(message, cursor)?;
                labels.push(label);
                cursor = rest;
            }
            POINTER => {
                let (rest, low) = be_u8(rest)?;
                let target = usize::from(u16::from_be_bytes([len & 0x3F, low]));
                if target >= limit {
                    return Err(WireError::fail(
                        cursor,
                        DecodeError::BadPointer {
                            offset: offset(message, cursor),
                            target,
                        },
                    ));
                }
                resume.get_or_insert(rest);
                limit = target;
                cursor = &message[target..];
            }
            _ => {
                return Err(WireError::fail(
                    cursor,
                    DecodeError::ReservedLabelPrefix {
                        offset: offset(message, cursor),
                        prefix: len,
                    },
                ))
            }
        }
    }
    Ok((resume.unwrap_or(cursor), join_asciis(&labels)))
}

/// Read one byte as a u8. Then read that many following bytes and output them, as ASCII.
fn parse_label<'m>(message: &'m [u8], i: &'m [u8]) -> IResult<&'m [u8], AsciiString, WireError> {
    let (rest, bytes) = length_prefixed(be_u8)(i)?;
    match AsciiStr::from_ascii(bytes) {
        Ok(label) => Ok((rest, label.to_ascii_string())),
        Err(_) => Err(WireError::fail(
            i,
            DecodeError::NonAsciiLabel {
                offset: offset(message, i),
            },
        )),
    }
}

/// Write `name` uncompressed: each label as a length byte and its ASCII bytes, then a zero
/// byte. One trailing dot is allowed, and the empty name is the root.
pub fn serialize_name(name: &str, bv: &mut BitVec<u8, Msb0>) -> Result<(), EncodeError> {
    let labels = labels_of(name)?;
    for label in labels {
        // The mapping of domain names to labels is defined in RFC 1035:
        // 2.3.1. Preferred name syntax
        let len = label.len() as u8;
        bv.extend_from_bitslice(len.view_bits::<Msb0>());
        label
            .chars()
            .map(|ch| ch.as_byte())
            .for_each(|byte| bv.extend_from_bitslice(byte.view_bits::<Msb0>()));
    }
    bv.extend_from_bitslice(0u8.view_bits::<Msb0>());
    Ok(())
}

/// Split a name into labels that are all known to fit on the wire.
fn labels_of(name: &str) -> Result<Vec<&AsciiStr>, EncodeError> {
    let trimmed = name.strip_suffix('.').unwrap_or(name);
    let ascii = AsciiStr::from_ascii(trimmed)
        .map_err(|_| EncodeError::NonAscii(name.to_owned()))?;
    if ascii.is_empty() {
        return Ok(Vec::new());
    }
    let labels: Vec<_> = ascii.split(AsciiChar::Dot).collect();
    let mut wire_len = 1;
    for label in &labels {
        if label.is_empty() {
            return Err(EncodeError::EmptyLabel(name.to_owned()));
        }
        if label.len() > MAX_LABEL_BYTES {
            return Err(EncodeError::LabelTooLong {
                label: label.to_string(),
                len: label.len(),
            });
        }
        wire_len += 1 + label.len();
    }
    if wire_len > MAX_NAME_BYTES {
        return Err(EncodeError::NameTooLong(wire_len));
    }
    Ok(labels)
}
