//! SQL sanitization into a canonical single-line form.
//!
//! The sanitizer is the first pipeline stage: every statement is normalized
//! before the guard, the shape parser, or the driver sees it. It strips
//! `-- line`, `# line`, and `/* block */` comments while preserving
//! `/*+ hint */` optimizer hints bit-for-bit, collapses whitespace runs to
//! single spaces, trims the result, and removes trailing `;` terminators.
//!
//! String literals are left untouched: comment markers and whitespace inside
//! quotes are data, not syntax.
//!
//! # Example
//!
//! ```
//! use query_sentinel::sanitize::sanitize;
//!
//! let sql = "  SELECT * FROM users -- all\n;; ";
//! assert_eq!(sanitize(sql), "SELECT * FROM users");
//!
//! let hinted = "SELECT /*+ MAX_EXECUTION_TIME(1000) */ id FROM users";
//! assert_eq!(sanitize(hinted), hinted);
//! ```

/// Sanitize raw SQL into canonical form.
///
/// Empty and comment-only input yield an empty string; rejecting empty
/// statements is the execution guard's job, not this layer's.
#[must_use]
pub fn sanitize(sql: &str) -> String {
    let stripped = strip_comments(sql);
    let collapsed = collapse_whitespace(&stripped);
    let mut out = collapsed.trim().to_string();
    while out.ends_with(';') {
        out.pop();
        out.truncate(out.trim_end().len());
    }
    out
}

/// Remove comments, keeping `/*+ ... */` hints verbatim.
fn strip_comments(sql: &str) -> String {
    let bytes = sql.as_bytes();
    let mut out = String::with_capacity(sql.len());
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i] as char;
        match c {
            '\'' | '"' | '`' => {
                let end = literal_end(sql, i, c);
                out.push_str(&sql[i..end]);
                i = end;
            }
            '-' if bytes.get(i + 1) == Some(&b'-') => {
                i = line_comment_end(bytes, i);
                out.push(' ');
            }
            '#' => {
                i = line_comment_end(bytes, i);
                out.push(' ');
            }
            '/' if bytes.get(i + 1) == Some(&b'*') => {
                let end = block_comment_end(bytes, i);
                if bytes.get(i + 2) == Some(&b'+') {
                    out.push_str(&sql[i..end]);
                } else {
                    out.push(' ');
                }
                i = end;
            }
            _ => {
                out.push(c);
                i += c.len_utf8();
            }
        }
    }

    out
}

/// Find the byte index one past the closing quote of a literal.
///
/// Handles doubled-quote escaping (`''`) and backslash escapes inside
/// single/double quoted strings. Unterminated literals run to end of input.
fn literal_end(sql: &str, start: usize, quote: char) -> usize {
    let bytes = sql.as_bytes();
    let mut i = start + 1;
    while i < bytes.len() {
        let c = bytes[i] as char;
        if c == '\\' && quote != '`' {
            i += 2;
            continue;
        }
        if c == quote {
            if bytes.get(i + 1) == Some(&(quote as u8)) {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    bytes.len()
}

fn line_comment_end(bytes: &[u8], start: usize) -> usize {
    let mut i = start;
    while i < bytes.len() && bytes[i] != b'\n' {
        i += 1;
    }
    i
}

fn block_comment_end(bytes: &[u8], start: usize) -> usize {
    let mut i = start + 2;
    while i + 1 < bytes.len() {
        if bytes[i] == b'*' && bytes[i + 1] == b'/' {
            return i + 2;
        }
        i += 1;
    }
    bytes.len()
}

/// Collapse whitespace runs to single spaces outside string literals.
fn collapse_whitespace(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut chars = sql.char_indices();
    let mut pending_space = false;

    while let Some((i, c)) = chars.next() {
        if c == '\'' || c == '"' || c == '`' {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            let end = literal_end(sql, i, c);
            out.push_str(&sql[i..end]);
            while let Some((j, _)) = chars.next() {
                if j + 1 >= end {
                    break;
                }
            }
            continue;
        }
        if c.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space && !out.is_empty() {
            out.push(' ');
        }
        pending_space = false;
        out.push(c);
    }

    out
}
