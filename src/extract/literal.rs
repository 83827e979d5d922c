//! Decoding of Python string literal source text.

/// Decode the source text of a single string literal (prefix and quotes
/// included). Byte strings and f-strings have no plain text value and yield
/// `None`.
pub(super) fn decode(text: &str) -> Option<String> {
    let quote_start = text.find(['"', '\''])?;
    let (prefix, quoted) = text.split_at(quote_start);

    let mut raw = false;
    for c in prefix.chars() {
        match c.to_ascii_lowercase() {
            'r' => raw = true,
            'u' => {}
            // bytes, f-strings
            _ => return None,
        }
    }

    let body = strip_quotes(quoted)?;
    if raw {
        Some(body.to_string())
    } else {
        Some(unescape(body))
    }
}

fn strip_quotes(quoted: &str) -> Option<&str> {
    for delimiter in ["\"\"\"", "'''", "\"", "'"] {
        if quoted.len() >= 2 * delimiter.len() && quoted.starts_with(delimiter) && quoted.ends_with(delimiter)
        {
            return Some(&quoted[delimiter.len()..quoted.len() - delimiter.len()]);
        }
    }
    None
}

fn unescape(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(escaped) = chars.next() else {
            out.push('\\');
            break;
        };
        match escaped {
            '\n' => {}
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            'a' => out.push('\x07'),
            'b' => out.push('\x08'),
            'f' => out.push('\x0c'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'v' => out.push('\x0b'),
            '0'..='7' => {
                let mut digits = escaped.to_string();
                while digits.len() < 3 {
                    match chars.peek() {
                        Some(d @ '0'..='7') => {
                            digits.push(*d);
                            chars.next();
                        }
                        _ => break,
                    }
                }
                push_code_point(&mut out, &digits, 8);
            }
            'x' => push_hex(&mut out, &mut chars, 'x', 2),
            'u' => push_hex(&mut out, &mut chars, 'u', 4),
            'U' => push_hex(&mut out, &mut chars, 'U', 8),
            // \N{NAME} and unknown escapes are kept as written
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }
    out
}

fn push_hex(
    out: &mut String,
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    marker: char,
    width: usize,
) {
    let mut digits = String::with_capacity(width);
    while digits.len() < width {
        match chars.peek() {
            Some(d) if d.is_ascii_hexdigit() => {
                digits.push(*d);
                chars.next();
            }
            _ => break,
        }
    }
    if digits.len() == width {
        push_code_point(out, &digits, 16);
    } else {
        out.push('\\');
        out.push(marker);
        out.push_str(&digits);
    }
}

fn push_code_point(out: &mut String, digits: &str, radix: u32) {
    match u32::from_str_radix(digits, radix).ok().and_then(char::from_u32) {
        Some(c) => out.push(c),
        None => out.push(char::REPLACEMENT_CHARACTER),
    }
}
