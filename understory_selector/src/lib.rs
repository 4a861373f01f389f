// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Selector: compile and match the simple selectors used for event delegation.
//!
//! ## Overview
//!
//! Selectors are deliberately small: tag names, `#id` and `.class` atoms,
//! concatenated into simple selectors and separated by whitespace for
//! descendant matching. Commas separate alternatives.
//!
//! - [`compile`](crate::compile::compile) turns one selector into an
//!   ancestor-first [`Chain`](crate::token::Chain) of [`Token`](crate::token::Token)s.
//! - [`split_selector_list`](crate::compile::split_selector_list) splits a
//!   comma-separated list before compilation.
//! - [`ClassMatcher`](crate::class::ClassMatcher) tests a node, described by
//!   [`ElementData`](crate::class::ElementData), against a single token and
//!   memoizes one class pattern per class name.
//!
//! ## Example
//!
//! ```
//! use understory_selector::class::{ElementData, matches_token};
//! use understory_selector::compile::compile;
//!
//! let chain = compile("ul.menu li.item").unwrap();
//! let li = ElementData { tag_name: "LI", id: None, class_name: "item active" };
//! assert!(matches_token(Some(&li), chain.target()));
//! assert!(!matches_token(Some(&li), &chain.tokens()[0]));
//! ```
//!
//! Matching a whole chain against an ancestor path is the job of a
//! dispatcher such as `understory_delegate`, which walks from an event target
//! toward the root and consumes chains right to left.

pub mod class;
pub mod compile;
pub mod error;
pub mod token;

pub use class::{ClassMatcher, ElementData};
pub use compile::{compile, split_selector_list};
pub use error::MalformedSelector;
pub use token::{Chain, Token};
