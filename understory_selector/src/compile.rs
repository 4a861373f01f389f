// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Selector compiler.
//!
//! ## Grammar
//!
//! - `tag`, `#id` and `.class` atoms, concatenable without separators: `li#x.a.b`.
//! - Whitespace separates descendant segments: `ul.menu li`.
//! - Commas separate alternative selectors; split those with
//!   [`split_selector_list`] before calling [`compile`].
//!
//! Nothing else is accepted. Characters such as `>`, `+`, `[`, `:` or `*`
//! produce [`MalformedSelector::UnsupportedCharacter`] rather than being
//! folded into a name.

use crate::error::MalformedSelector;
use crate::token::{Chain, Token};

/// Compile one selector into an ancestor-first [`Chain`].
///
/// Tag names are uppercased. Runs of whitespace count as a single descendant
/// separator; leading and trailing whitespace is ignored. Empty or
/// whitespace-only text compiles to [`Chain::wildcard`].
///
/// ```
/// use understory_selector::compile::compile;
///
/// let chain = compile("ul.menu li.item").unwrap();
/// assert_eq!(chain.depth(), 2);
/// assert_eq!(chain.target().tag_name(), Some("LI"));
/// assert!(compile("div.").is_err());
/// ```
pub fn compile(selector: &str) -> Result<Chain, MalformedSelector> {
    let mut tokens = Vec::new();
    let mut current: Option<Token> = None;
    let mut pos = 0;

    while let Some(ch) = selector[pos..].chars().next() {
        if ch.is_whitespace() {
            if let Some(token) = current.take() {
                tokens.push(token);
            }
            pos += ch.len_utf8();
            continue;
        }
        match ch {
            '#' | '.' => {
                let name_start = pos + 1;
                let name = scan_name(&selector[name_start..]);
                if name.is_empty() {
                    return Err(MalformedSelector::DanglingSigil {
                        selector: selector.to_owned(),
                        sigil: ch,
                        offset: pos,
                    });
                }
                let token = current.get_or_insert_with(Token::default);
                if ch == '#' {
                    if token.id().is_some() {
                        return Err(MalformedSelector::ConflictingId {
                            selector: selector.to_owned(),
                            id: name.to_owned(),
                            offset: pos,
                        });
                    }
                    token.set_id(name);
                } else {
                    token.insert_class(name);
                }
                pos = name_start + name.len();
            }
            // A bare name can only open a segment: any name following a sigil
            // is consumed whole by the arm above.
            c if is_name_char(c) => {
                let name = scan_name(&selector[pos..]);
                current.get_or_insert_with(Token::default).set_tag(name);
                pos += name.len();
            }
            _ => {
                return Err(MalformedSelector::UnsupportedCharacter {
                    selector: selector.to_owned(),
                    ch,
                    offset: pos,
                });
            }
        }
    }

    if let Some(token) = current {
        tokens.push(token);
    }
    Ok(Chain::new(tokens).unwrap_or_else(Chain::wildcard))
}

/// Split a comma-separated selector list into its alternatives.
///
/// Whitespace around each comma is trimmed. The grammar has no nesting, so
/// every comma is top-level.
pub fn split_selector_list(text: &str) -> impl Iterator<Item = &str> + '_ {
    text.split(',').map(str::trim)
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_' || (!c.is_ascii() && !c.is_whitespace())
}

fn scan_name(s: &str) -> &str {
    let end = s.find(|c: char| !is_name_char(c)).unwrap_or(s.len());
    &s[..end]
}
