//! Reading `.properties` files.
//!
//! The grammar is the one of `java.util.Properties.load(InputStream)`: ISO-8859-1
//! input, `#`/`!` comments, `key=value`, `key: value` or `key value` pairs,
//! backslash line continuations and `\uXXXX` escapes.

use std::collections::HashMap;
use std::io::Read;

#[derive(Debug, thiserror::Error)]
pub enum PropertiesError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("line {line}: malformed \\uxxxx encoding")]
    MalformedUnicode { line: usize },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    entries: HashMap<String, String>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read and parse everything from `reader`.
    pub fn load<R: Read>(mut reader: R) -> Result<Self, PropertiesError> {
        let mut bytes = vec![];
        reader.read_to_end(&mut bytes)?;
        let text = bytes.iter().map(|&b| b as char).collect::<String>();
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, PropertiesError> {
        let mut entries = HashMap::new();
        let mut lines = natural_lines(text).into_iter().enumerate();

        while let Some((index, line)) = lines.next() {
            let line = trim_leading(line);
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }

            let mut logical = String::new();
            let mut current = line;
            loop {
                if ends_with_continuation(current) {
                    logical.push_str(&current[..current.len() - 1]);
                    match lines.next() {
                        Some((_, next)) => current = trim_leading(next),
                        None => break,
                    }
                } else {
                    logical.push_str(current);
                    break;
                }
            }

            let line_number = index + 1;
            let (key, value) = split_pair(&logical);
            entries.insert(unescape(key, line_number)?, unescape(value, line_number)?);
        }

        Ok(Properties { entries })
    }

    /// The value of `key`, like `getProperty`.
    pub fn get_property(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\x0c')
}

fn trim_leading(s: &str) -> &str {
    s.trim_start_matches(is_blank)
}

/// Split on `\n`, `\r` and `\r\n`.
fn natural_lines(text: &str) -> Vec<&str> {
    let mut lines = vec![];
    let mut start = 0;
    let bytes = text.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\n' => {
                lines.push(&text[start..i]);
                start = i + 1;
            }
            b'\r' => {
                lines.push(&text[start..i]);
                if bytes.get(i + 1) == Some(&b'\n') {
                    i += 1;
                }
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }

    if start < text.len() {
        lines.push(&text[start..]);
    }

    lines
}

fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|c| *c == '\\').count() % 2 == 1
}

/// Find the key and value of a logical line, both still escaped.
fn split_pair(line: &str) -> (&str, &str) {
    let mut escaped = false;
    let mut key_end = line.len();
    let mut value_start = line.len();
    let mut has_separator = false;

    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => {
                key_end = i;
                value_start = i + 1;
                has_separator = true;
                break;
            }
            c if is_blank(c) => {
                key_end = i;
                value_start = i + c.len_utf8();
                break;
            }
            _ => {}
        }
    }

    let mut value = trim_leading(&line[value_start..]);
    if !has_separator {
        if let Some(rest) = value.strip_prefix(['=', ':']) {
            value = trim_leading(rest);
        }
    }

    (&line[..key_end], value)
}

fn unescape(s: &str, line: usize) -> Result<String, PropertiesError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            result.push(ch);
            continue;
        }

        match chars.next() {
            Some('t') => result.push('\t'),
            Some('n') => result.push('\n'),
            Some('r') => result.push('\r'),
            Some('f') => result.push('\x0c'),
            Some('u') => {
                let unit = read_code_unit(&mut chars, line)?;
                if (0xD800..0xDC00).contains(&unit) {
                    let rest = chars.as_str();
                    let low = rest
                        .strip_prefix("\\u")
                        .and_then(|hex| hex.get(..4))
                        .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                        .filter(|low| (0xDC00..0xE000).contains(low));
                    match low {
                        Some(low) => {
                            chars = rest[6..].chars();
                            let code = 0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00);
                            result.push(char::from_u32(code).unwrap_or('\u{FFFD}'));
                        }
                        None => result.push('\u{FFFD}'),
                    }
                } else {
                    result.push(char::from_u32(unit).unwrap_or('\u{FFFD}'));
                }
            }
            Some(other) => result.push(other),
            None => {}
        }
    }

    Ok(result)
}

fn read_code_unit(chars: &mut std::str::Chars, line: usize) -> Result<u32, PropertiesError> {
    let mut unit = 0;
    for _ in 0..4 {
        let digit = chars
            .next()
            .and_then(|c| c.to_digit(16))
            .ok_or(PropertiesError::MalformedUnicode { line })?;
        unit = unit * 16 + digit;
    }
    Ok(unit)
}
