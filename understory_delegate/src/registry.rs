// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Subscriber registry: event type → ordered subscriber records.
//!
//! ## Overview
//!
//! Each `listen()` call expands a comma-separated selector list into one
//! [`Subscriber`] per alternative, all sharing the same handler. Records are
//! kept in registration order per event type.
//!
//! Dispatch works on a [`snapshot`](SubscriberRegistry::snapshot) of the list,
//! so registrations made while a dispatch is running do not apply to it.
//! Removal clears a record's active flag as well, which an in-flight dispatch
//! checks before touching the record.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use understory_selector::{Chain, MalformedSelector, compile, split_selector_list};

use crate::error::BoxError;
use crate::types::{CompileMode, EventType};

/// Handler invoked with the event and the bound element.
pub type Handler<K, E> = Arc<dyn Fn(&E, &K) -> Result<(), BoxError> + Send + Sync>;

/// Identifier of a subscriber record, unique within one registry.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

/// One selector alternative bound to a handler.
pub struct Subscriber<K, E> {
    id: SubscriberId,
    rule: String,
    compiled: OnceLock<Result<Chain, MalformedSelector>>,
    handler: Handler<K, E>,
    active: AtomicBool,
    reported: AtomicBool,
}

impl<K, E> core::fmt::Debug for Subscriber<K, E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Subscriber")
            .field("id", &self.id)
            .field("rule", &self.rule)
            .field("compiled", &self.compiled.get())
            .field("active", &self.is_active())
            .finish_non_exhaustive()
    }
}

impl<K, E> Subscriber<K, E> {
    /// Record identifier.
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// The selector alternative this record matches.
    pub fn rule(&self) -> &str {
        &self.rule
    }

    /// Whether the record is still registered.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// The compiled chain, compiling on first use.
    pub fn chain(&self) -> Result<&Chain, &MalformedSelector> {
        self.compiled.get_or_init(|| compile(&self.rule)).as_ref()
    }

    /// Whether compilation has happened yet.
    pub fn is_compiled(&self) -> bool {
        self.compiled.get().is_some()
    }

    pub(crate) fn handler(&self) -> &Handler<K, E> {
        &self.handler
    }

    pub(crate) fn deactivate(&self) {
        self.active.store(false, Ordering::Release);
    }

    /// Returns `true` exactly once, for the first caller.
    pub(crate) fn take_compile_report(&self) -> bool {
        !self.reported.swap(true, Ordering::AcqRel)
    }
}

/// Records created by one [`SubscriberRegistry::register`] call.
#[derive(Debug)]
pub struct Registration<K, E> {
    /// One record per selector alternative.
    pub subscribers: Vec<Arc<Subscriber<K, E>>>,
    /// `true` if this was the first registration for the event type, so a
    /// native listener must be attached.
    pub first_for_type: bool,
}

/// Event type → subscriber list.
pub struct SubscriberRegistry<K, E> {
    by_type: HashMap<EventType, Vec<Arc<Subscriber<K, E>>>>,
    next_id: u64,
}

impl<K, E> core::fmt::Debug for SubscriberRegistry<K, E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut map = f.debug_map();
        for (ty, list) in &self.by_type {
            map.entry(&ty.as_str(), &list.len());
        }
        map.finish()
    }
}

impl<K, E> Default for SubscriberRegistry<K, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, E> SubscriberRegistry<K, E> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            by_type: HashMap::new(),
            next_id: 0,
        }
    }

    /// Register `handler` for every alternative of `selector`.
    ///
    /// In [`CompileMode::Eager`] every alternative is compiled first and the
    /// call fails without registering anything if one is malformed.
    pub fn register(
        &mut self,
        selector: &str,
        event_type: EventType,
        handler: Handler<K, E>,
        mode: CompileMode,
    ) -> Result<Registration<K, E>, MalformedSelector> {
        let rules: Vec<(&str, OnceLock<Result<Chain, MalformedSelector>>)> = match mode {
            CompileMode::Eager => split_selector_list(selector)
                .map(|rule| compile(rule).map(|chain| (rule, OnceLock::from(Ok(chain)))))
                .collect::<Result<_, _>>()?,
            CompileMode::Lazy => split_selector_list(selector)
                .map(|rule| (rule, OnceLock::new()))
                .collect(),
        };

        let first_for_type = !self.by_type.contains_key(&event_type);
        let list = self.by_type.entry(event_type).or_default();
        let mut subscribers = Vec::with_capacity(rules.len());
        for (rule, compiled) in rules {
            let subscriber = Arc::new(Subscriber {
                id: SubscriberId(self.next_id),
                rule: rule.to_owned(),
                compiled,
                handler: Arc::clone(&handler),
                active: AtomicBool::new(true),
                reported: AtomicBool::new(false),
            });
            self.next_id += 1;
            list.push(Arc::clone(&subscriber));
            subscribers.push(subscriber);
        }
        Ok(Registration {
            subscribers,
            first_for_type,
        })
    }

    /// Remove the given records from `event_type`'s list, returning how many were removed.
    ///
    /// The list itself stays, so a later registration for the same type does
    /// not attach a second native listener.
    pub fn unregister(&mut self, event_type: &EventType, ids: &[SubscriberId]) -> usize {
        let Some(list) = self.by_type.get_mut(event_type) else {
            return 0;
        };
        let before = list.len();
        list.retain(|sub| {
            let remove = ids.contains(&sub.id);
            if remove {
                sub.deactivate();
            }
            !remove
        });
        before - list.len()
    }

    /// The current subscribers for `event_type`, in registration order.
    pub fn snapshot(&self, event_type: &EventType) -> Vec<Arc<Subscriber<K, E>>> {
        self.by_type.get(event_type).cloned().unwrap_or_default()
    }

    /// Number of subscribers for `event_type`.
    pub fn len(&self, event_type: &EventType) -> usize {
        self.by_type.get(event_type).map_or(0, Vec::len)
    }

    /// Returns `true` if no event type has subscribers.
    pub fn is_empty(&self) -> bool {
        self.by_type.values().all(Vec::is_empty)
    }

    /// Event types that have had a listener attached.
    pub fn event_types(&self) -> impl Iterator<Item = &EventType> + '_ {
        self.by_type.keys()
    }
}
