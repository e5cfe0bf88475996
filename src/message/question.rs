use crate::{
    dns_types::{Class, RecordType},
    error::EncodeError,
    message::name::{parse_name, serialize_name},
    parse::WireError,
};
use bitvec::prelude::*;
use nom::{combinator::map_res, number::complete::be_u16, IResult};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    /// Dot-separated labels without a trailing dot.
    pub name: String,
    pub record_type: RecordType,
    pub class: Class,
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.class, self.record_type, self.name)
    }
}

impl Question {
    pub fn new(name: impl Into<String>, record_type: RecordType, class: Class) -> Self {
        Self {
            name: name.into(),
            record_type,
            class,
        }
    }

    pub fn serialize(&self, bv: &mut BitVec<u8, Msb0>) -> Result<(), EncodeError> {
        // QNAME   a domain name represented as a sequence of labels, where
        //         each label consists of a length octet followed by that
        //         number of octets.
        serialize_name(&self.name, bv)?;
        self.record_type.serialize(bv);
        self.class.serialize(bv);
        Ok(())
    }

    /// Parse one question. `message` is the whole message, for following name pointers.
    pub fn deserialize<'m>(message: &'m [u8], i: &'m [u8]) -> IResult<&'m [u8], Self, WireError> {
        let (i, name) = parse_name(message, i)?;
        let (i, record_type) = map_res(be_u16, RecordType::try_from)(i)?;
        let (i, class) = map_res(be_u16, Class::try_from)(i)?;
        Ok((
            i,
            Self {
                name,
                record_type,
                class,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecodeError;

    #[test]
    fn test_serialize_question() {
        let question = Question::new("adamchalmers.com", RecordType::A, Class::IN);
        let mut bv = BitVec::<u8, Msb0>::new();
        question.serialize(&mut bv).unwrap();
        let bytes = bv.into_vec();
        let expected_bytes = "adamchalmers".len() + 1 // First label
        + "com".len() + 1 // Second label
        + 1 // Last empty label
        + 2 // QTYPE is 16 bits
        + 2; // QCLASS is 16 bits
        assert_eq!(bytes.len(), expected_bytes);
        assert_eq!(&bytes[bytes.len() - 4..], &[0, 1, 0, 1]);
    }

    #[test]
    fn test_round_trip() {
        let names = [
            "example.com".to_owned(),
            "a.b.c.d.e".to_owned(),
            "MiXeD-Case.Example".to_owned(),
            format!("{}.org", "x".repeat(63)),
            String::new(),
        ];
        for name in names {
            for (record_type, class) in [
                (RecordType::Aaaa, Class::IN),
                (RecordType::All, Class::ANY),
                (RecordType::Caa, Class::CH),
            ] {
                let question = Question::new(name.clone(), record_type, class);
                let mut bv = BitVec::<u8, Msb0>::new();
                question.serialize(&mut bv).unwrap();
                let bytes = bv.into_vec();
                let (rest, parsed) = Question::deserialize(&bytes, &bytes).unwrap();
                assert!(rest.is_empty());
                assert_eq!(parsed, question);
            }
        }
    }

    #[test]
    fn test_display() {
        let question = Question::new("example.com", RecordType::Mx, Class::IN);
        assert_eq!(question.to_string(), "IN MX: example.com");
    }

    #[test]
    fn test_unknown_class() {
        let bytes = [0, 0, 1, 0, 9];
        let err = match Question::deserialize(&bytes, &bytes) {
            Err(nom::Err::Error(e)) => e.into_decode_error(bytes.len()),
            other => panic!("expected an error, got {other:?}"),
        };
        assert_eq!(err, DecodeError::UnknownClass(9));
    }
}
