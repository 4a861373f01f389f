// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compiled selector types: simple-selector [`Token`]s and ancestor-first [`Chain`]s.
//!
//! ## Overview
//!
//! A [`Token`] constrains exactly one node by tag name, id and classes.
//! A [`Chain`] is the compiled form of a descendant selector such as
//! `ul.menu li.item`; its leftmost token constrains the topmost ancestor and
//! its rightmost token constrains the node nearest the event target.

use core::fmt;

/// A simple selector: tag, id and class constraints matched against a single node.
///
/// Tag names are stored uppercased. Classes are kept sorted and deduplicated
/// so that two tokens requiring the same set of classes compare equal.
///
/// A token with no constraints is the wildcard and matches any node.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Token {
    tag_name: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
}

impl Token {
    /// The unconstrained token.
    pub fn wildcard() -> Self {
        Self::default()
    }

    /// Require the node's tag name (compared ASCII case-insensitively).
    pub fn with_tag(mut self, tag_name: &str) -> Self {
        self.tag_name = Some(tag_name.to_ascii_uppercase());
        self
    }

    /// Require the node's id.
    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_owned());
        self
    }

    /// Require a class on the node.
    pub fn with_class(mut self, class: &str) -> Self {
        self.insert_class(class);
        self
    }

    /// Uppercased tag name constraint, if any.
    pub fn tag_name(&self) -> Option<&str> {
        self.tag_name.as_deref()
    }

    /// Id constraint, if any.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Required classes, sorted.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Returns `true` if this token places no constraint on a node.
    pub fn is_wildcard(&self) -> bool {
        self.tag_name.is_none() && self.id.is_none() && self.classes.is_empty()
    }

    pub(crate) fn set_tag(&mut self, tag_name: &str) {
        self.tag_name = Some(tag_name.to_ascii_uppercase());
    }

    pub(crate) fn set_id(&mut self, id: &str) {
        self.id = Some(id.to_owned());
    }

    pub(crate) fn insert_class(&mut self, class: &str) {
        if let Err(at) = self.classes.binary_search_by(|c| c.as_str().cmp(class)) {
            self.classes.insert(at, class.to_owned());
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(tag) = &self.tag_name {
            f.write_str(&tag.to_ascii_lowercase())?;
        }
        if let Some(id) = &self.id {
            write!(f, "#{id}")?;
        }
        for class in &self.classes {
            write!(f, ".{class}")?;
        }
        Ok(())
    }
}

/// A compiled descendant selector: a non-empty, ancestor-first sequence of [`Token`]s.
///
/// Produced by [`compile`](crate::compile::compile). Dispatch walks from the
/// event target upward and therefore consumes a chain right to left.
///
/// `Display` renders the canonical selector text, which compiles back to an
/// equal chain.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Chain {
    tokens: Vec<Token>,
}

impl Chain {
    /// Build a chain from ancestor-first tokens.
    ///
    /// Returns `None` when `tokens` is empty.
    pub fn new(tokens: Vec<Token>) -> Option<Self> {
        if tokens.is_empty() {
            None
        } else {
            Some(Self { tokens })
        }
    }

    /// The single-token chain that matches any node.
    pub fn wildcard() -> Self {
        Self {
            tokens: vec![Token::wildcard()],
        }
    }

    /// Tokens in ancestor-first order.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Number of tokens; always at least one.
    pub fn depth(&self) -> usize {
        self.tokens.len()
    }

    /// Token at `index` (0 is the topmost ancestor constraint).
    pub fn get(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    /// The rightmost, most specific token.
    pub fn target(&self) -> &Token {
        // A chain is never empty.
        &self.tokens[self.tokens.len() - 1]
    }

    /// Returns `true` for the single wildcard token chain.
    pub fn is_wildcard(&self) -> bool {
        self.tokens.len() == 1 && self.tokens[0].is_wildcard()
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, token) in self.tokens.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{token}")?;
        }
        Ok(())
    }
}
