// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Failure handling.
//!
//! Shows the two compile modes, a failing handler, and a walk that stops at
//! an opaque node. Set `RUST_LOG=understory_delegate=trace` to watch the
//! dispatch walk.
//!
//! Run:
//! - `cargo run -p understory_demos --example delegate_errors`

use understory_delegate::delegator::Delegator;
use understory_delegate::dom::{Document, Element, NodeId};
use understory_delegate::error::{DelegateError, error_chain};
use understory_delegate::types::{CompileMode, DelegatorConfig, EventType, NoBridge};
use understory_selector::compile;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let mut doc = Document::new();
    let frame = doc.append(doc.root(), Element::new("iframe").with_id("ad"));
    let div = doc.append(frame, Element::new("div").with_class("card"));
    let button = doc.append(div, Element::new("button").with_class("buy"));

    println!("== Compile ==");
    for text in ["div.card button", "button.", "li#a#b", "a > b", ""] {
        match compile(text) {
            Ok(chain) => println!("  {text:?} -> `{chain}` (depth {})", chain.depth()),
            Err(err) => println!("  {text:?} -> {err}"),
        }
    }

    println!("== Eager (default) ==");
    let eager: Delegator<NodeId, ()> = Delegator::new();
    if let Err(err) = eager.listen("button, .buy.", "click", |_: &(), _: &NodeId| Ok(())) {
        println!("  rejected: {err}");
    }
    println!("  registered: {}", eager.subscriber_count(&EventType::Click));

    println!("== Lazy ==");
    let config = DelegatorConfig::default().with_compile_mode(CompileMode::Lazy);
    let lazy: Delegator<NodeId, ()> = Delegator::with_config(NoBridge, config);
    lazy.set_error_sink(|err| match err {
        DelegateError::Selector { selector, .. } => {
            tracing::warn!(%selector, "sink: subscriber disabled");
        }
        DelegateError::Handler { .. } => {
            tracing::warn!(error = %error_chain(err), "sink: handler failed");
        }
    });
    lazy.listen("button, .buy.", "click", |_: &(), node: &NodeId| {
        println!("  button handler bound to {node:?}");
        Ok(())
    })
    .expect("lazy registration does not compile");
    lazy.listen("div.card", "click", |_: &(), _: &NodeId| {
        Err("card is sold out".into())
    })
    .expect("valid selector");
    lazy.listen("#ad", "click", |_: &(), _: &NodeId| {
        println!("  frame handler");
        Ok(())
    })
    .expect("valid selector");

    println!("  first dispatch: {:?}", lazy.dispatch(&EventType::Click, &doc, button, &()));
    println!("  second dispatch: {:?}", lazy.dispatch(&EventType::Click, &doc, button, &()));

    println!("== Opaque frame ==");
    doc.set_opaque(frame, true);
    println!("  {:?}", lazy.dispatch(&EventType::Click, &doc, button, &()));
}
