use ascii::AsciiString;

pub fn join_asciis(asciis: &[AsciiString]) -> String {
    let v: Vec<_> = asciis.iter().map(|a| a.as_str()).collect();
    v.join(".")
}

/// Text fields are ASCII. Anything outside it becomes U+FFFD rather than failing the record.
pub fn ascii_lossy(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| {
            if b.is_ascii() {
                char::from(b)
            } else {
                char::REPLACEMENT_CHARACTER
            }
        })
        .collect()
}
