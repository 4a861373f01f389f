// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The delegation root object.
//!
//! ## Usage
//!
//! - Construct one [`Delegator`] per delegation root with [`Delegator::new`],
//!   or [`Delegator::with_bridge`] to be told when native listeners must be
//!   attached.
//! - Register behavior with [`Delegator::listen`]; keep the returned
//!   [`Subscription`] to remove it later.
//! - Forward each native event with [`Delegator::dispatch`].
//!
//! A `Delegator` is a cheap, cloneable handle. Handlers may register,
//! unregister and dispatch through it while a dispatch is running: the
//! registry lock is never held while a handler runs.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak};

use understory_selector::MalformedSelector;

use crate::dispatch;
use crate::error::{BoxError, DelegateError, ErrorSink, log_error};
use crate::registry::{Handler, Subscriber, SubscriberId, SubscriberRegistry};
use crate::types::{
    DelegatorConfig, DispatchSummary, ElementLookup, EventType, ListenerBridge, ListenerFlags,
    NoBridge,
};

struct Inner<K, E> {
    registry: Mutex<SubscriberRegistry<K, E>>,
    bridge: Box<dyn ListenerBridge>,
    config: DelegatorConfig,
    sink: RwLock<ErrorSink>,
}

impl<K, E> Inner<K, E> {
    fn registry(&self) -> MutexGuard<'_, SubscriberRegistry<K, E>> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Event delegation for one root.
pub struct Delegator<K, E> {
    inner: Arc<Inner<K, E>>,
}

impl<K, E> Clone for Delegator<K, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, E> core::fmt::Debug for Delegator<K, E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Delegator")
            .field("config", &self.inner.config)
            .field("registry", &*self.inner.registry())
            .finish_non_exhaustive()
    }
}

impl<K, E> Default for Delegator<K, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, E> Delegator<K, E> {
    /// Create a delegator with default configuration and no listener bridge.
    pub fn new() -> Self {
        Self::with_config(NoBridge, DelegatorConfig::default())
    }

    /// Create a delegator that asks `bridge` to attach native listeners.
    pub fn with_bridge(bridge: impl ListenerBridge + 'static) -> Self {
        Self::with_config(bridge, DelegatorConfig::default())
    }

    /// Create a delegator with an explicit bridge and configuration.
    pub fn with_config(bridge: impl ListenerBridge + 'static, config: DelegatorConfig) -> Self {
        let sink: ErrorSink = Arc::new(log_error);
        Self {
            inner: Arc::new(Inner {
                registry: Mutex::new(SubscriberRegistry::new()),
                bridge: Box::new(bridge),
                config,
                sink: RwLock::new(sink),
            }),
        }
    }

    /// The configuration this delegator was built with.
    pub fn config(&self) -> DelegatorConfig {
        self.inner.config
    }

    /// Replace the error sink. The default logs through `tracing`.
    pub fn set_error_sink(&self, sink: impl Fn(&DelegateError) + Send + Sync + 'static) {
        *self
            .inner
            .sink
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Arc::new(sink);
    }

    /// Register `handler` for `event_type` on nodes matching `selector`.
    ///
    /// `selector` may be a comma-separated list; each alternative becomes an
    /// independent subscriber sharing the handler, so a node matching several
    /// alternatives invokes the handler once per matching alternative.
    ///
    /// In [`CompileMode::Eager`](crate::types::CompileMode::Eager) (the
    /// default) a malformed selector is rejected here and nothing is
    /// registered.
    ///
    /// The first registration for an event type asks the
    /// [`ListenerBridge`] to attach a native listener.
    pub fn listen<F>(
        &self,
        selector: &str,
        event_type: impl Into<EventType>,
        handler: F,
    ) -> Result<Subscription<K, E>, MalformedSelector>
    where
        F: Fn(&E, &K) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        let config = self.inner.config;
        let event_type = config.normalize(event_type.into());
        let handler: Handler<K, E> = Arc::new(handler);
        let registration = self.inner.registry().register(
            selector,
            event_type.clone(),
            handler,
            config.compile_mode,
        )?;

        if registration.first_for_type {
            if !event_type.bubbles() && !config.flags.contains(ListenerFlags::CAPTURE) {
                tracing::warn!(
                    %event_type,
                    "event does not bubble and the root listener is not capturing"
                );
            }
            tracing::debug!(%event_type, flags = ?config.flags, "attaching root listener");
            self.inner.bridge.attach(&event_type, config.flags);
        }

        Ok(Subscription {
            inner: Arc::downgrade(&self.inner),
            event_type,
            subscribers: registration.subscribers,
        })
    }

    /// Dispatch one native event that reached the root with the given `target`.
    ///
    /// Walks from `target` to the root once and invokes every subscriber of
    /// `event_type` whose selector is satisfied, bound to the node that
    /// matched the selector's last simple selector. Never fails: handler
    /// errors and malformed lazy selectors go to the error sink, and a node
    /// that denies access quietly ends the walk.
    pub fn dispatch<L>(
        &self,
        event_type: &EventType,
        lookup: &L,
        target: K,
        event: &E,
    ) -> DispatchSummary
    where
        K: Clone,
        L: ElementLookup<K> + ?Sized,
    {
        let snapshot = self.inner.registry().snapshot(event_type);
        if snapshot.is_empty() {
            return DispatchSummary::default();
        }
        let sink = Arc::clone(&self.inner.sink.read().unwrap_or_else(PoisonError::into_inner));
        dispatch::run(event_type, &snapshot, lookup, target, event, &*sink)
    }

    /// Number of subscribers currently registered for `event_type`.
    pub fn subscriber_count(&self, event_type: &EventType) -> usize {
        self.inner.registry().len(event_type)
    }

    /// Event types a root listener has been attached for.
    pub fn event_types(&self) -> Vec<EventType> {
        self.inner.registry().event_types().cloned().collect()
    }
}

/// Handle to the subscribers created by one [`Delegator::listen`] call.
///
/// Dropping the handle does not unregister; call [`unregister`](Self::unregister).
pub struct Subscription<K, E> {
    inner: Weak<Inner<K, E>>,
    event_type: EventType,
    subscribers: Vec<Arc<Subscriber<K, E>>>,
}

impl<K, E> core::fmt::Debug for Subscription<K, E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Subscription")
            .field("event_type", &self.event_type)
            .field("selectors", &self.selectors().collect::<Vec<_>>())
            .field("active", &self.is_active())
            .finish_non_exhaustive()
    }
}

impl<K, E> Subscription<K, E> {
    /// The event type the subscribers were filed under (after aliasing).
    pub fn event_type(&self) -> &EventType {
        &self.event_type
    }

    /// The selector alternatives, one per subscriber.
    pub fn selectors(&self) -> impl Iterator<Item = &str> + '_ {
        self.subscribers.iter().map(|sub| sub.rule())
    }

    /// Whether any of the subscribers is still registered.
    pub fn is_active(&self) -> bool {
        self.subscribers.iter().any(|sub| sub.is_active())
    }

    /// Remove the subscribers. Idempotent.
    ///
    /// Safe to call from a handler during dispatch: the removed subscribers
    /// are skipped for the rest of that dispatch and never fire again.
    pub fn unregister(&self) {
        for sub in &self.subscribers {
            sub.deactivate();
        }
        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        let ids: Vec<SubscriberId> = self.subscribers.iter().map(|sub| sub.id()).collect();
        let removed = inner.registry().unregister(&self.event_type, &ids);
        if removed > 0 {
            tracing::trace!(event_type = %self.event_type, removed, "unregistered subscribers");
        }
    }
}
