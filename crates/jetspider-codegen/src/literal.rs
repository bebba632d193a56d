//! Decoding of string literals.
//!
//! The parser hands string literals over in their lexical form, quotes and
//! escape sequences included. They are decoded here exactly as the
//! language's literal grammar would, before being interned as atoms.
//!
//! | Escape | Meaning |
//! |--------|---------|
//! | `\n` `\r` `\t` `\b` `\f` `\v` | Control characters |
//! | `\0` | Null (when not followed by an octal digit) |
//! | `\1`-`\377` | Legacy octal escape |
//! | `\xNN` | Hex escape |
//! | `\uNNNN` | UTF-16 code unit, surrogate pairs combined |
//! | `\u{N...}` | Code point |
//! | `\` + line terminator | Line continuation, produces nothing |
//! | `\` + other | The character itself |

use std::iter::Peekable;
use std::str::Chars;

use crate::Error;

/// Decodes a quoted string literal into its value.
pub fn decode_string(raw: &str) -> Result<String, Error> {
    let invalid = || Error::InvalidStringLiteral(raw.to_string());

    let mut chars = raw.chars();
    let quote = match chars.next() {
        Some(q @ ('\'' | '"')) => q,
        _ => return Err(invalid()),
    };
    let mut chars = chars.peekable();
    let mut value = String::new();

    loop {
        match chars.next() {
            None => return Err(invalid()),
            Some(ch) if ch == quote => break,
            Some('\n' | '\r') => return Err(invalid()),
            Some('\\') => {
                let escaped = chars.next().ok_or_else(invalid)?;
                match escaped {
                    'n' => value.push('\n'),
                    'r' => value.push('\r'),
                    't' => value.push('\t'),
                    'b' => value.push('\u{8}'),
                    'f' => value.push('\u{c}'),
                    'v' => value.push('\u{b}'),
                    '0' if !chars.peek().is_some_and(|ch| ch.is_digit(8)) => value.push('\0'),
                    '0'..='7' => value.push(read_octal(escaped, &mut chars)),
                    'x' => {
                        let code = read_hex(&mut chars, 2).ok_or_else(invalid)?;
                        value.push(char::from_u32(code).ok_or_else(invalid)?);
                    }
                    'u' => value.push(read_unicode_escape(&mut chars).ok_or_else(invalid)?),
                    '\r' => {
                        if chars.peek() == Some(&'\n') {
                            chars.next();
                        }
                    }
                    '\n' | '\u{2028}' | '\u{2029}' => {}
                    other => value.push(other),
                }
            }
            Some(ch) => value.push(ch),
        }
    }

    if chars.next().is_some() {
        return Err(invalid());
    }
    Ok(value)
}

fn read_hex(chars: &mut Peekable<Chars<'_>>, digits: usize) -> Option<u32> {
    let mut code = 0;
    for _ in 0..digits {
        code = code * 16 + chars.next()?.to_digit(16)?;
    }
    Some(code)
}

/// Legacy octal escape: `\0`-`\377`, at most three digits.
fn read_octal(first: char, chars: &mut Peekable<Chars<'_>>) -> char {
    let mut code = first.to_digit(8).unwrap_or(0);
    let max_digits = if first <= '3' { 3 } else { 2 };
    for _ in 1..max_digits {
        match chars.peek().and_then(|ch| ch.to_digit(8)) {
            Some(digit) => {
                code = code * 8 + digit;
                chars.next();
            }
            None => break,
        }
    }
    char::from(code as u8)
}

fn read_unicode_escape(chars: &mut Peekable<Chars<'_>>) -> Option<char> {
    if chars.peek() == Some(&'{') {
        chars.next();
        let mut code: u32 = 0;
        let mut digits = 0;
        loop {
            let ch = chars.next()?;
            if ch == '}' {
                break;
            }
            code = code.checked_mul(16)?.checked_add(ch.to_digit(16)?)?;
            digits += 1;
        }
        if digits == 0 {
            return None;
        }
        return char::from_u32(code);
    }

    let unit = read_hex(chars, 4)?;
    if !(0xD800..0xDC00).contains(&unit) {
        // Lone low surrogates cannot be held in a Rust string.
        return Some(char::from_u32(unit).unwrap_or(char::REPLACEMENT_CHARACTER));
    }

    // High surrogate: combine with a following \uDC00-\uDFFF escape.
    let mut lookahead = chars.clone();
    if lookahead.next() == Some('\\') && lookahead.next() == Some('u') {
        if let Some(low) = read_hex(&mut lookahead, 4) {
            if (0xDC00..0xE000).contains(&low) {
                *chars = lookahead;
                let code = 0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00);
                return char::from_u32(code);
            }
        }
    }
    Some(char::REPLACEMENT_CHARACTER)
}
