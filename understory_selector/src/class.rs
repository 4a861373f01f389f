// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node matching: whole-token class tests and [`Token`] matching.
//!
//! ## Pattern cache
//!
//! [`ClassMatcher`] compiles one matcher per distinct class name and keeps it
//! for its own lifetime. Entries are written once and only read afterwards,
//! so the cache sits behind an `RwLock` and lookups for populated keys take
//! the read side only.
//!
//! The free functions [`has_class`] and [`matches_token`] use a process-wide
//! instance, [`ClassMatcher::global`].

use std::collections::HashMap;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use fancy_regex::Regex;

use crate::token::Token;

/// Borrowed view of the properties a [`Token`] can constrain.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ElementData<'a> {
    /// Tag name as reported by the host (any case).
    pub tag_name: &'a str,
    /// The `id` attribute, if present.
    pub id: Option<&'a str>,
    /// The raw, whitespace-delimited `class` attribute.
    pub class_name: &'a str,
}

/// Memoizing whole-token class matcher.
#[derive(Debug, Default)]
pub struct ClassMatcher {
    patterns: RwLock<HashMap<String, Arc<Regex>>>,
}

static GLOBAL: LazyLock<ClassMatcher> = LazyLock::new(ClassMatcher::new);

impl ClassMatcher {
    /// Create a matcher with an empty pattern cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide matcher.
    pub fn global() -> &'static Self {
        &GLOBAL
    }

    /// Returns `true` if `required` appears as a whole whitespace-delimited
    /// token of `class_attribute`.
    pub fn has_class(&self, class_attribute: &str, required: &str) -> bool {
        if required.is_empty() {
            return false;
        }
        let Some(pattern) = self.pattern(required) else {
            return false;
        };
        match pattern.is_match(class_attribute) {
            Ok(found) => found,
            Err(err) => {
                tracing::warn!(class = required, %err, "class matcher failed");
                false
            }
        }
    }

    /// Returns `true` if every class in `required` is present.
    pub fn has_all<S: AsRef<str>>(&self, class_attribute: &str, required: &[S]) -> bool {
        required
            .iter()
            .all(|class| self.has_class(class_attribute, class.as_ref()))
    }

    /// Returns `true` if `element` satisfies every constraint of `token`.
    ///
    /// `None` stands for a non-element node (text, document), which only the
    /// wildcard token matches.
    pub fn matches_token(&self, element: Option<&ElementData<'_>>, token: &Token) -> bool {
        let Some(element) = element else {
            return token.is_wildcard();
        };
        token
            .tag_name()
            .is_none_or(|tag| tag.eq_ignore_ascii_case(element.tag_name))
            && token.id().is_none_or(|id| element.id == Some(id))
            && self.has_all(element.class_name, token.classes())
    }

    /// Number of cached class patterns.
    pub fn cached_patterns(&self) -> usize {
        self.patterns
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn pattern(&self, class: &str) -> Option<Arc<Regex>> {
        if let Some(pattern) = self
            .patterns
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(class)
        {
            return Some(Arc::clone(pattern));
        }

        let source = format!(r"(?:^|\s){}(?:\s|$)", fancy_regex::escape(class));
        let compiled = match Regex::new(&source) {
            Ok(re) => Arc::new(re),
            Err(err) => {
                tracing::warn!(class, %err, "could not compile class matcher");
                return None;
            }
        };
        let mut patterns = self
            .patterns
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let entry = patterns.entry(class.to_owned()).or_insert_with(|| {
            tracing::debug!(class, "cached class matcher");
            compiled
        });
        Some(Arc::clone(entry))
    }
}

/// [`ClassMatcher::has_class`] on the process-wide matcher.
pub fn has_class(class_attribute: &str, required: &str) -> bool {
    ClassMatcher::global().has_class(class_attribute, required)
}

/// [`ClassMatcher::matches_token`] on the process-wide matcher.
pub fn matches_token(element: Option<&ElementData<'_>>, token: &Token) -> bool {
    ClassMatcher::global().matches_token(element, token)
}
