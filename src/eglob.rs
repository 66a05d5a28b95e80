//! Extended glob matching for function-name filters.
//!
//! Beyond `*` (any run of bytes, possibly empty) and `?` (exactly one byte),
//! patterns support alternation with `:` and grouping with `(` `)`, e.g.
//! `alpha:be(t:l)a:g*a:d???a:ep(x(xx:yy)y:z*z)silon:sig(ma:)`. A subject
//! matches only as a whole string, and a group matches when any of its
//! branches does. Matching is byte-wise; patterns and function names are
//! treated as raw bytes.

/// Match `subject` against the extended glob `pattern`.
pub fn match_eglob(pattern: &str, subject: &str) -> bool {
    eglob(pattern.as_bytes(), subject.as_bytes())
}

/// Try each top-level alternative of `pattern` in turn.
fn eglob(mut pattern: &[u8], subject: &[u8]) -> bool {
    loop {
        if glob(pattern, subject) {
            return true;
        }
        match find_end_of_glob(pattern, b':') {
            Some(next) => pattern = next,
            None => return false,
        }
    }
}

/// Match a single alternative. The basic `*`/`?` walk follows Kernighan's
/// matcher from Beautiful Code; the `(`/`)`/`:` cases splice in the
/// alternation grammar.
fn glob(mut pattern: &[u8], mut subject: &[u8]) -> bool {
    loop {
        match pattern.first() {
            // A group is an alternation list of its own.
            Some(b'(') => return eglob(&pattern[1..], subject),
            // End of a satisfied group; carry on after it.
            Some(b')') => pattern = &pattern[1..],
            // This alternative already matched up to the alternation, so
            // the whole group is satisfied; skip past its closing paren.
            // A dangling `:` with no closing paren terminates the pattern.
            Some(b':') => match find_end_of_glob(pattern, b')') {
                Some(next) => pattern = next,
                None => return subject.is_empty(),
            },
            None => return subject.is_empty(),
            // Ignore more and more of the subject until the rest matches
            // or the subject runs out.
            Some(b'*') => {
                pattern = &pattern[1..];
                loop {
                    if glob(pattern, subject) {
                        return true;
                    }
                    if subject.is_empty() {
                        return false;
                    }
                    subject = &subject[1..];
                }
            }
            Some(b'?') => {
                if subject.is_empty() {
                    return false;
                }
                pattern = &pattern[1..];
                subject = &subject[1..];
            }
            Some(&literal) => {
                if subject.first() != Some(&literal) {
                    return false;
                }
                pattern = &pattern[1..];
                subject = &subject[1..];
            }
        }
    }
}

/// Position just past the first `delimiter` in the outermost grouping
/// scope, or `None` if an unbalanced `)` or the end of the pattern comes
/// first.
fn find_end_of_glob(pattern: &[u8], delimiter: u8) -> Option<&[u8]> {
    let mut depth = 0usize;
    for (i, &byte) in pattern.iter().enumerate() {
        if depth == 0 && byte == delimiter {
            return Some(&pattern[i + 1..]);
        }
        if byte == b'(' {
            depth += 1;
        } else if byte == b')' {
            if depth > 0 {
                depth -= 1;
            } else {
                return None;
            }
        }
    }
    None
}
