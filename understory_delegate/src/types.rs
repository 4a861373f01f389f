// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core types for delegation: event types, listener flags, configuration, lookups and summaries.
//!
//! ## Overview
//!
//! These types describe what the [`Delegator`](crate::delegator::Delegator)
//! needs from its host (an [`ElementLookup`] to read nodes, a
//! [`ListenerBridge`] to attach native listeners) and what it reports back
//! ([`DispatchSummary`]).

use core::fmt;

use understory_selector::ElementData;

/// Event type a subscriber listens for.
///
/// Commonly delegated events have named variants; anything else is
/// [`Custom`](Self::Custom). Build values with [`EventType::parse`] (or the
/// `From` conversions) so a known name never ends up as `Custom`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum EventType {
    /// `click`
    Click,
    /// `mousedown`
    MouseDown,
    /// `mouseup`
    MouseUp,
    /// `mousemove`
    MouseMove,
    /// `mouseover`
    MouseOver,
    /// `mouseout`
    MouseOut,
    /// `keydown`
    KeyDown,
    /// `keypress`
    KeyPress,
    /// `keyup`
    KeyUp,
    /// `focus`; does not bubble.
    Focus,
    /// `blur`; does not bubble.
    Blur,
    /// `focusin`
    FocusIn,
    /// `focusout`
    FocusOut,
    /// Any other event name.
    Custom(Box<str>),
}

impl EventType {
    /// Map an event name to its variant. Names are case-sensitive, as in the DOM.
    pub fn parse(name: &str) -> Self {
        match name {
            "click" => Self::Click,
            "mousedown" => Self::MouseDown,
            "mouseup" => Self::MouseUp,
            "mousemove" => Self::MouseMove,
            "mouseover" => Self::MouseOver,
            "mouseout" => Self::MouseOut,
            "keydown" => Self::KeyDown,
            "keypress" => Self::KeyPress,
            "keyup" => Self::KeyUp,
            "focus" => Self::Focus,
            "blur" => Self::Blur,
            "focusin" => Self::FocusIn,
            "focusout" => Self::FocusOut,
            other => Self::Custom(other.into()),
        }
    }

    /// The event name.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Click => "click",
            Self::MouseDown => "mousedown",
            Self::MouseUp => "mouseup",
            Self::MouseMove => "mousemove",
            Self::MouseOver => "mouseover",
            Self::MouseOut => "mouseout",
            Self::KeyDown => "keydown",
            Self::KeyPress => "keypress",
            Self::KeyUp => "keyup",
            Self::Focus => "focus",
            Self::Blur => "blur",
            Self::FocusIn => "focusin",
            Self::FocusOut => "focusout",
            Self::Custom(name) => name,
        }
    }

    /// Whether the event bubbles to the delegation root.
    ///
    /// Non-bubbling events only reach a root listener attached in the capture
    /// phase, see [`ListenerFlags::CAPTURE`].
    pub fn bubbles(&self) -> bool {
        !matches!(self, Self::Focus | Self::Blur)
    }
}

impl From<&str> for EventType {
    fn from(name: &str) -> Self {
        Self::parse(name)
    }
}

impl From<String> for EventType {
    fn from(name: String) -> Self {
        Self::parse(&name)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

bitflags::bitflags! {
    /// Options for native listeners attached at the delegation root.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ListenerFlags: u8 {
        /// Attach in the capture phase so non-bubbling events still reach the root.
        const CAPTURE      = 0b0000_0001;
        /// Register `focus` as `focusin` and `blur` as `focusout`, for hosts
        /// that deliver only the bubbling focus events.
        const FOCUS_IN_OUT = 0b0000_0010;
    }
}

impl Default for ListenerFlags {
    fn default() -> Self {
        Self::CAPTURE
    }
}

/// When subscriber selectors are compiled.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum CompileMode {
    /// Compile at `listen()` time; malformed selectors are rejected there.
    #[default]
    Eager,
    /// Compile on the first dispatch that reaches the subscriber. Malformed
    /// selectors are reported through the error sink and never match.
    Lazy,
}

/// Delegator configuration.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct DelegatorConfig {
    /// Selector compilation policy.
    pub compile_mode: CompileMode,
    /// Flags passed to the [`ListenerBridge`] and applied to event names.
    pub flags: ListenerFlags,
}

impl DelegatorConfig {
    /// Set the compilation policy.
    pub fn with_compile_mode(mut self, mode: CompileMode) -> Self {
        self.compile_mode = mode;
        self
    }

    /// Set the listener flags.
    pub fn with_flags(mut self, flags: ListenerFlags) -> Self {
        self.flags = flags;
        self
    }

    /// The event type a registration for `event_type` is filed under.
    pub fn normalize(&self, event_type: EventType) -> EventType {
        if !self.flags.contains(ListenerFlags::FOCUS_IN_OUT) {
            return event_type;
        }
        match event_type {
            EventType::Focus => EventType::FocusIn,
            EventType::Blur => EventType::FocusOut,
            other => other,
        }
    }
}

/// A node's properties could not be read during a walk (for example across a
/// cross-origin boundary).
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, thiserror::Error)]
#[error("node is not accessible from the delegation root")]
pub struct NodeAccessDenied;

/// Read access to the host tree during dispatch.
///
/// Either method may deny access; the dispatch in progress then stops
/// without invoking further handlers.
pub trait ElementLookup<K> {
    /// Element properties of `node`, or `None` for non-element nodes (text,
    /// document) which only match the wildcard selector.
    fn element(&self, node: &K) -> Result<Option<ElementData<'_>>, NodeAccessDenied>;

    /// The parent of `node`, or `None` past the root.
    fn parent_of(&self, node: &K) -> Result<Option<K>, NodeAccessDenied>;
}

/// Attaches native listeners at the delegation root.
///
/// The [`Delegator`](crate::delegator::Delegator) calls [`attach`](Self::attach)
/// exactly once per distinct event type, when the first subscriber for that
/// type is registered. The host then forwards each native event to
/// [`Delegator::dispatch`](crate::delegator::Delegator::dispatch).
pub trait ListenerBridge: Send + Sync {
    /// Attach one native listener for `event_type` at the root.
    fn attach(&self, event_type: &EventType, flags: ListenerFlags);
}

/// A bridge that attaches nothing, for hosts that forward every event anyway.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoBridge;

impl ListenerBridge for NoBridge {
    #[inline]
    fn attach(&self, _event_type: &EventType, _flags: ListenerFlags) {}
}

/// What a single dispatch did.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct DispatchSummary {
    /// Nodes read on the walk from the target upward.
    pub visited: usize,
    /// Handlers invoked.
    pub fired: usize,
    /// Handlers that returned an error or panicked.
    pub handler_errors: usize,
    /// The walk stopped at a node that denied access.
    pub aborted: bool,
}
