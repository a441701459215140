use super::parsers::{
    is_block_comment_end, is_block_comment_start, is_hash_comment_start, is_line_comment_start,
    placeholder_at,
};

#[derive(Clone, Copy, PartialEq, Eq)]
pub(super) enum State {
    Normal,
    SingleQuoted,
    DoubleQuoted,
    Backticked,
    LineComment,
    BlockComment,
}

/// A `:name` placeholder found outside literals and comments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct PlaceholderSpan<'a> {
    pub(super) start: usize,
    pub(super) end: usize,
    pub(super) name: &'a str,
}

/// Walk `sql` with MySQL lexical rules and collect every named placeholder.
pub(super) fn scan_placeholders(sql: &str) -> Vec<PlaceholderSpan<'_>> {
    let bytes = sql.as_bytes();
    let mut spans = Vec::new();
    let mut state = State::Normal;
    let mut idx = 0;

    while idx < bytes.len() {
        let b = bytes[idx];
        match state {
            State::Normal => match b {
                b'\'' => state = State::SingleQuoted,
                b'"' => state = State::DoubleQuoted,
                b'`' => state = State::Backticked,
                _ if is_line_comment_start(bytes, idx) || is_hash_comment_start(bytes, idx) => {
                    state = State::LineComment;
                }
                _ if is_block_comment_start(bytes, idx) => {
                    state = State::BlockComment;
                    idx += 1;
                }
                b':' => {
                    if let Some(end) = placeholder_at(bytes, idx) {
                        spans.push(PlaceholderSpan {
                            start: idx,
                            end,
                            name: &sql[idx + 1..end],
                        });
                        idx = end;
                        continue;
                    }
                }
                _ => {}
            },
            State::SingleQuoted | State::DoubleQuoted => {
                let quote = if state == State::SingleQuoted {
                    b'\''
                } else {
                    b'"'
                };
                if b == b'\\' {
                    idx += 1; // backslash escape
                } else if b == quote {
                    if bytes.get(idx + 1) == Some(&quote) {
                        idx += 1; // doubled quote
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::Backticked => {
                if b == b'`' {
                    if bytes.get(idx + 1) == Some(&b'`') {
                        idx += 1;
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::LineComment => {
                if b == b'\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment => {
                if is_block_comment_end(bytes, idx) {
                    state = State::Normal;
                    idx += 1;
                }
            }
        }
        idx += 1;
    }

    spans
}
