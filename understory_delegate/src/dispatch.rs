// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dispatch engine: one upward walk, every subscriber advanced in lockstep.
//!
//! ## Algorithm
//!
//! Each subscriber gets a small state machine holding the number of chain
//! tokens still to match and the node bound as handler context. Walking from
//! the target toward the root, every unsatisfied subscriber tests its next
//! token (right to left) against the current node. A match consumes the
//! token; the first match binds the node. When the last token is consumed the
//! handler runs, once, with the bound node.
//!
//! A node consumes at most one token per subscriber, so `"div div"` needs two
//! distinct nested divs.
//!
//! ## Ordering
//!
//! Handlers fire in completion order: a subscriber satisfied at a shallower
//! node fires before one satisfied further up. Subscribers completing at the
//! same node fire in registration order.
//!
//! ## Failures
//!
//! - A node that denies access ends the walk; handlers that already ran stay run.
//! - A handler error or panic is reported and the walk continues.
//! - A malformed, lazily compiled selector is reported once and never matches.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use understory_selector::class::matches_token;

use crate::error::{DelegateError, HandlerError};
use crate::registry::Subscriber;
use crate::types::{DispatchSummary, ElementLookup, EventType};

/// Per-subscriber progress through its chain during one dispatch.
#[derive(Clone, Debug)]
struct DispatchState<K> {
    /// Tokens left to match; the next one is at index `remaining - 1`.
    remaining: usize,
    bound: Option<K>,
}

impl<K> DispatchState<K> {
    fn new(remaining: usize) -> Self {
        Self {
            remaining,
            bound: None,
        }
    }

    fn is_done(&self) -> bool {
        self.remaining == 0
    }
}

/// Walk from `target` to the root, invoking every subscriber whose chain is satisfied.
pub(crate) fn run<K, E, L>(
    event_type: &EventType,
    subscribers: &[Arc<Subscriber<K, E>>],
    lookup: &L,
    target: K,
    event: &E,
    report: &dyn Fn(&DelegateError),
) -> DispatchSummary
where
    K: Clone,
    L: ElementLookup<K> + ?Sized,
{
    let mut summary = DispatchSummary::default();
    if subscribers.is_empty() {
        return summary;
    }

    let mut states: Vec<DispatchState<K>> = subscribers
        .iter()
        .map(|sub| match sub.chain() {
            Ok(chain) => DispatchState::new(chain.depth()),
            Err(err) => {
                if sub.take_compile_report() {
                    report(&DelegateError::Selector {
                        event_type: event_type.clone(),
                        selector: sub.rule().to_owned(),
                        source: err.clone(),
                    });
                }
                DispatchState::new(0)
            }
        })
        .collect();
    let mut pending = states.iter().filter(|s| !s.is_done()).count();

    tracing::trace!(%event_type, subscribers = subscribers.len(), "dispatch start");

    let mut node = Some(target);
    while let Some(current) = node {
        if pending == 0 {
            break;
        }
        let element = match lookup.element(&current) {
            Ok(element) => element,
            Err(denied) => {
                tracing::debug!(%event_type, %denied, "dispatch aborted");
                summary.aborted = true;
                return summary;
            }
        };
        summary.visited += 1;

        for (sub, state) in subscribers.iter().zip(states.iter_mut()) {
            if state.is_done() {
                continue;
            }
            if !sub.is_active() {
                state.remaining = 0;
                pending -= 1;
                continue;
            }
            let Ok(chain) = sub.chain() else {
                continue;
            };
            let Some(token) = chain.get(state.remaining - 1) else {
                continue;
            };
            if !matches_token(element.as_ref(), token) {
                continue;
            }

            state.remaining -= 1;
            let bound = state.bound.get_or_insert_with(|| current.clone());
            if state.remaining > 0 {
                continue;
            }
            pending -= 1;
            summary.fired += 1;
            if let Err(source) = invoke(sub, event, bound) {
                summary.handler_errors += 1;
                report(&DelegateError::Handler {
                    event_type: event_type.clone(),
                    selector: sub.rule().to_owned(),
                    source,
                });
            }
        }

        node = match lookup.parent_of(&current) {
            Ok(parent) => parent,
            Err(denied) => {
                tracing::debug!(%event_type, %denied, "dispatch aborted");
                summary.aborted = true;
                return summary;
            }
        };
    }

    tracing::trace!(
        %event_type,
        visited = summary.visited,
        fired = summary.fired,
        "dispatch end"
    );
    summary
}

fn invoke<K, E>(sub: &Subscriber<K, E>, event: &E, bound: &K) -> Result<(), HandlerError> {
    let handler = sub.handler();
    match panic::catch_unwind(AssertUnwindSafe(|| handler(event, bound))) {
        Ok(result) => result.map_err(HandlerError::Failed),
        Err(payload) => Err(HandlerError::from_panic(payload)),
    }
}
