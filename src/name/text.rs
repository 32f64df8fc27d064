// Copyright 2022 Matthew Ingwersen.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you
// may not use this file except in compliance with the License. You may
// obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or
// implied. See the License for the specific language governing
// permissions and limitations under the License.

//! The zone-file text form of names.
//!
//! A name is written as labels each followed by a period, e.g.
//! `www.example.`. Within a label, `\X` stands for the character `X`
//! and `\DDD` for the octet with decimal value `DDD`. Names containing
//! anything other than ASCII letters, digits, `-`, `_`, `*`, periods
//! and escapes must be surrounded by double quotes, inside of which
//! whitespace is allowed.

use std::fmt::Write;

use arrayvec::ArrayVec;

use super::{Error, LabelBuf, Name, MAX_LABEL_LEN, MAX_N_LABELS};

/// Options controlling how strictly the text form of names is parsed.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct ReprOptions {
    /// When set, a name without a trailing dot is rejected with
    /// [`Error::MissingTrailingDot`]. When clear, such a name is taken
    /// to be fully qualified anyway.
    pub require_trailing_dot: bool,
}

impl Default for ReprOptions {
    fn default() -> Self {
        Self {
            require_trailing_dot: true,
        }
    }
}

/// Whether `octet` may appear in a name that is not double-quoted.
fn can_appear_unquoted(octet: u8) -> bool {
    octet.is_ascii_alphanumeric() || matches!(octet, b'-' | b'_' | b'.' | b'\\' | b'*')
}

impl Name {
    /// Parses a name from the start of `text` with the default
    /// [`ReprOptions`], returning it along with the unparsed remainder.
    ///
    /// An unquoted name ends at the first whitespace character; a
    /// quoted name ends after its closing double quote.
    pub fn decode_repr(text: &str) -> Result<(Self, &str), Error> {
        Self::decode_repr_with(text, ReprOptions::default())
    }

    /// Like [`Name::decode_repr`], but with explicit options.
    pub fn decode_repr_with(text: &str, options: ReprOptions) -> Result<(Self, &str), Error> {
        let octets = text.as_bytes();
        let quoted = octets.first() == Some(&b'"');
        let mut p = usize::from(quoted);
        let mut labels: Vec<LabelBuf> = Vec::new();
        let mut current = ArrayVec::<u8, MAX_LABEL_LEN>::new();

        loop {
            let octet = match octets.get(p) {
                Some(&octet) => octet,
                None if quoted => return Err(Error::UnexpectedEom),
                None => break,
            };
            if !quoted && octet.is_ascii_whitespace() {
                break;
            }
            match octet {
                b'.' => {
                    // Only the root may be spelled with a lone dot.
                    let after_root = labels.last().map_or(false, |label| label.is_null());
                    if after_root || (current.is_empty() && !labels.is_empty()) {
                        return Err(Error::EmptyLabel);
                    }
                    labels.push(LabelBuf::from(std::mem::take(&mut current)));
                    if labels.len() > MAX_N_LABELS {
                        return Err(Error::TooManyLabels);
                    }
                }
                b'\\' => {
                    let (unescaped, consumed) = unescape(&octets[p + 1..])?;
                    current
                        .try_push(unescaped)
                        .map_err(|_| Error::LabelTooLong)?;
                    p += consumed;
                }
                b'"' if quoted => {
                    p += 1;
                    break;
                }
                _ if !quoted && !can_appear_unquoted(octet) => return Err(Error::NeedsQuotes),
                _ => current.try_push(octet).map_err(|_| Error::LabelTooLong)?,
            }
            p += 1;
        }

        if !current.is_empty() {
            if options.require_trailing_dot {
                return Err(Error::MissingTrailingDot);
            } else if labels.last().map_or(false, |label| label.is_null()) {
                return Err(Error::EmptyLabel);
            }
            labels.push(LabelBuf::from(current));
        }
        match labels.last() {
            None => return Err(Error::EmptyName),
            Some(last) if !last.is_null() => labels.push(LabelBuf::null()),
            Some(_) => (),
        }

        // Only ASCII octets end the loop, so p is on a char boundary.
        Ok((Self::from_label_bufs(labels)?, &text[p..]))
    }

    /// Produces the text form of the name. This is the inverse of
    /// [`Name::decode_repr`]: special characters are escaped, and the
    /// whole name is double-quoted if anything in it requires quoting.
    pub fn repr(&self) -> String {
        if self.is_root() {
            return String::from(".");
        }
        let mut body = String::new();
        for label in self.labels_from_root().rev() {
            // Writing into a String cannot fail.
            let _ = write!(body, "{}.", label);
        }
        if body.bytes().all(can_appear_unquoted) {
            body
        } else {
            format!("\"{}\"", body)
        }
    }
}

/// Decodes the escape sequence following a backslash, returning the
/// octet it stands for and the number of octets consumed after the
/// backslash.
fn unescape(after_backslash: &[u8]) -> Result<(u8, usize), Error> {
    match after_backslash {
        [a, b, c, ..] if a.is_ascii_digit() && b.is_ascii_digit() && c.is_ascii_digit() => {
            let value = [a, b, c]
                .iter()
                .fold(0u16, |acc, digit| acc * 10 + u16::from(**digit - b'0'));
            u8::try_from(value)
                .map(|octet| (octet, 3))
                .map_err(|_| Error::InvalidEscape)
        }
        [octet, ..] => Ok((*octet, 1)),
        [] => Err(Error::InvalidEscape),
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
