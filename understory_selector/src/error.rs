// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Selector compilation errors.

/// A selector string outside the supported tag/id/class descendant grammar.
///
/// Every variant carries the offending selector text and the byte offset of
/// the problem within it.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MalformedSelector {
    /// `#` or `.` with no name following it.
    #[error("`{sigil}` at offset {offset} in selector `{selector}` is not followed by a name")]
    DanglingSigil {
        /// Selector text being compiled.
        selector: String,
        /// The sigil, `#` or `.`.
        sigil: char,
        /// Byte offset of the sigil.
        offset: usize,
    },
    /// A character that is neither part of a name nor a supported separator.
    #[error("unsupported character `{ch}` at offset {offset} in selector `{selector}`")]
    UnsupportedCharacter {
        /// Selector text being compiled.
        selector: String,
        /// The rejected character.
        ch: char,
        /// Byte offset of the character.
        offset: usize,
    },
    /// A second `#id` atom within one simple selector.
    #[error("conflicting id `#{id}` at offset {offset} in selector `{selector}`")]
    ConflictingId {
        /// Selector text being compiled.
        selector: String,
        /// The second id.
        id: String,
        /// Byte offset of its `#`.
        offset: usize,
    },
}

impl MalformedSelector {
    /// The selector text that failed to compile.
    pub fn selector(&self) -> &str {
        match self {
            Self::DanglingSigil { selector, .. }
            | Self::UnsupportedCharacter { selector, .. }
            | Self::ConflictingId { selector, .. } => selector,
        }
    }

    /// Byte offset of the problem within [`selector`](Self::selector).
    pub fn offset(&self) -> usize {
        match self {
            Self::DanglingSigil { offset, .. }
            | Self::UnsupportedCharacter { offset, .. }
            | Self::ConflictingId { offset, .. } => *offset,
        }
    }
}
