// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Delegate: selector-scoped event delegation from a single root.
//!
//! ## Overview
//!
//! Instead of attaching a listener to every element, callers register a
//! handler for an event type scoped to a simple selector. One native listener
//! per event type sits at the delegation root. For each event the
//! [`Delegator`](crate::delegator::Delegator) walks once from the event target
//! up to the root and evaluates every subscriber of that event type in the
//! same pass.
//!
//! ## Selectors
//!
//! Tag names, `#id` and `.class` atoms, concatenated (`li#x.item`), with
//! whitespace for descendants (`ul.menu li`) and commas for alternatives
//! (`#panel, .widget`). See [`understory_selector`].
//!
//! ## Binding
//!
//! A handler receives the event and the *bound* node: the first node on the
//! walk that matched the selector's last simple selector. For `ul.menu li` and
//! a click on a `<span>` inside an `<li>`, the bound node is the `<li>`.
//!
//! ## Inputs
//!
//! - An [`ElementLookup`](crate::types::ElementLookup) reads tag, id, class
//!   and parent of the host's nodes. [`dom::Document`](crate::dom::Document)
//!   is a small ready-made tree.
//! - A [`ListenerBridge`](crate::types::ListenerBridge) is told once per event
//!   type when a native listener must be attached.
//!
//! ## Example
//!
//! ```
//! use std::sync::{Arc, Mutex};
//! use understory_delegate::delegator::Delegator;
//! use understory_delegate::dom::{Document, Element, NodeId};
//! use understory_delegate::types::EventType;
//!
//! let mut doc = Document::new();
//! let ul = doc.append(doc.root(), Element::new("ul").with_class("menu"));
//! let li = doc.append(ul, Element::new("li").with_class("item"));
//! let span = doc.append(li, Element::new("span"));
//!
//! let delegator: Delegator<NodeId, ()> = Delegator::new();
//! let hits = Arc::new(Mutex::new(Vec::new()));
//! let sink = Arc::clone(&hits);
//! delegator
//!     .listen("ul.menu li.item", "click", move |_event, node| {
//!         sink.lock().unwrap().push(*node);
//!         Ok(())
//!     })
//!     .unwrap();
//!
//! delegator.dispatch(&EventType::Click, &doc, span, &());
//! assert_eq!(*hits.lock().unwrap(), vec![li]);
//! ```
//!
//! ## Failures
//!
//! Dispatch never fails. Handler errors and panics are isolated per
//! subscriber and reported to an error sink (by default, `tracing`). A node
//! that denies access ends the walk quietly.

pub mod delegator;
mod dispatch;
pub mod dom;
pub mod error;
pub mod registry;
pub mod types;

pub use delegator::{Delegator, Subscription};
pub use types::{DelegatorConfig, DispatchSummary, ElementLookup, EventType, ListenerBridge};
