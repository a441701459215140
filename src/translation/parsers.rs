/// MySQL only treats `--` as a comment when followed by whitespace or end of input.
pub(super) fn is_line_comment_start(bytes: &[u8], idx: usize) -> bool {
    bytes.get(idx) == Some(&b'-')
        && bytes.get(idx + 1) == Some(&b'-')
        && bytes.get(idx + 2).is_none_or(u8::is_ascii_whitespace)
}

pub(super) fn is_hash_comment_start(bytes: &[u8], idx: usize) -> bool {
    bytes.get(idx) == Some(&b'#')
}

pub(super) fn is_block_comment_start(bytes: &[u8], idx: usize) -> bool {
    bytes.get(idx) == Some(&b'/') && bytes.get(idx + 1) == Some(&b'*')
}

pub(super) fn is_block_comment_end(bytes: &[u8], idx: usize) -> bool {
    bytes.get(idx) == Some(&b'*') && bytes.get(idx + 1) == Some(&b'/')
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// If a named placeholder starts at `idx` (which holds `:`), return the index one
/// past its last byte. `::` and `:=` are not placeholders.
pub(super) fn placeholder_at(bytes: &[u8], idx: usize) -> Option<usize> {
    if idx > 0 && bytes[idx - 1] == b':' {
        return None;
    }
    let first = *bytes.get(idx + 1)?;
    if !is_ident_start(first) {
        return None;
    }
    let mut end = idx + 2;
    while end < bytes.len() && is_ident_continue(bytes[end]) {
        end += 1;
    }
    Some(end)
}

/// Placeholder names must be plain identifiers so they survive the scanner.
pub(crate) fn is_placeholder_name(name: &str) -> bool {
    let bytes = name.as_bytes();
    !bytes.is_empty() && is_ident_start(bytes[0]) && bytes[1..].iter().all(|b| is_ident_continue(*b))
}
