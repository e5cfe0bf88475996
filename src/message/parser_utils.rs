use crate::parse::WireError;
use nom::{bits::complete::take, IResult};

/// Input for nom's bit-level parsers: the bytes not yet fully read, and how many bits of
/// the first byte have already been consumed.
///
/// Reading 3 bits from `([0b11110000, 0b11001100], 0)` leaves
/// `([0b11110000, 0b11001100], 3)`. Once a whole byte is used up nom drops it, so after
/// 6 more bits the input is `([0b11001100], 1)`.
pub type BitInput<'a> = (&'a [u8], usize);

/// Take 4 bits, most significant first, zero-padded into a u8.
pub fn take_nibble(i: BitInput) -> IResult<BitInput, u8, WireError> {
    take(4u8)(i)
}

pub fn take_u16(i: BitInput) -> IResult<BitInput, u16, WireError> {
    take(16u8)(i)
}

pub fn take_bit(i: BitInput) -> IResult<BitInput, bool, WireError> {
    let (i, bit): (BitInput, u8) = take(1u8)(i)?;
    Ok((i, bit != 0))
}

/// Skip over `n` bits whose value doesn't matter.
pub fn skip_bits(i: BitInput, n: u8) -> IResult<BitInput, (), WireError> {
    let (i, _): (BitInput, u8) = take(n)(i)?;
    Ok((i, ()))
}
