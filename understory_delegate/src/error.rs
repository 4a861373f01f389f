// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors reported by dispatch.
//!
//! Nothing here escapes [`Delegator::dispatch`](crate::delegator::Delegator::dispatch).
//! Failures are handed to the delegator's error sink, which logs them with
//! `tracing` unless replaced via
//! [`Delegator::set_error_sink`](crate::delegator::Delegator::set_error_sink).

use std::any::Any;
use std::error::Error;
use std::sync::Arc;

use understory_selector::MalformedSelector;

use crate::types::EventType;

/// Error type handlers may return; any error converts into it with `?`.
pub type BoxError = Box<dyn Error + Send + Sync>;

/// A handler failed.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    /// The handler returned an error.
    #[error("handler returned an error")]
    Failed(#[source] BoxError),
    /// The handler panicked; carries the panic message when it was a string.
    #[error("handler panicked: {0}")]
    Panicked(String),
}

impl HandlerError {
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = match payload.downcast::<String>() {
            Ok(message) => *message,
            Err(payload) => match payload.downcast::<&'static str>() {
                Ok(message) => (*message).to_owned(),
                Err(_) => "non-string panic payload".to_owned(),
            },
        };
        Self::Panicked(message)
    }
}

/// A failure isolated to one subscriber during dispatch.
#[derive(Debug, thiserror::Error)]
pub enum DelegateError {
    /// A lazily compiled selector turned out to be malformed; the subscriber never matches.
    #[error("selector `{selector}` for `{event_type}` is malformed")]
    Selector {
        /// Event type the subscriber listens for.
        event_type: EventType,
        /// The subscriber's selector.
        selector: String,
        /// Compilation error.
        source: MalformedSelector,
    },
    /// A handler failed; other subscribers were still evaluated.
    #[error("handler for `{selector}` on `{event_type}` failed")]
    Handler {
        /// Event type being dispatched.
        event_type: EventType,
        /// The subscriber's selector.
        selector: String,
        /// What went wrong.
        source: HandlerError,
    },
}

/// Receiver for [`DelegateError`]s.
pub type ErrorSink = Arc<dyn Fn(&DelegateError) + Send + Sync>;

/// Render `error` followed by each of its sources, separated by `": "`.
pub fn error_chain(error: &DelegateError) -> String {
    let mut out = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}

/// The default sink: log through `tracing`.
pub fn log_error(error: &DelegateError) {
    let chain = error_chain(error);
    match error {
        DelegateError::Selector { .. } => {
            tracing::warn!(error = %chain, "delegated selector never matches");
        }
        DelegateError::Handler { .. } => {
            tracing::error!(error = %chain, "delegated handler failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_payloads_keep_their_message() {
        let owned = HandlerError::from_panic(Box::new(String::from("boom")));
        assert!(matches!(owned, HandlerError::Panicked(ref m) if m == "boom"));
        let borrowed = HandlerError::from_panic(Box::new("bang"));
        assert!(matches!(borrowed, HandlerError::Panicked(ref m) if m == "bang"));
        let other = HandlerError::from_panic(Box::new(7_u8));
        assert!(matches!(other, HandlerError::Panicked(_)));
    }

    #[test]
    fn errors_name_the_subscriber() {
        let err = DelegateError::Handler {
            event_type: EventType::Click,
            selector: "li.item".to_owned(),
            source: HandlerError::Failed("nope".into()),
        };
        let text = err.to_string();
        assert!(text.contains("li.item"));
        assert!(text.contains("click"));
        assert!(err.source().is_some());
    }

    #[test]
    fn chain_names_each_cause_once() {
        let failed = HandlerError::Failed("out of stock".into());
        assert_eq!(failed.to_string(), "handler returned an error");
        assert_eq!(failed.source().map(ToString::to_string).as_deref(), Some("out of stock"));

        let err = DelegateError::Handler {
            event_type: EventType::Click,
            selector: "button.buy".to_owned(),
            source: failed,
        };
        let chain = error_chain(&err);
        assert_eq!(
            chain,
            "handler for `button.buy` on `click` failed: handler returned an error: out of stock"
        );
        assert_eq!(chain.matches("out of stock").count(), 1);
    }
}
