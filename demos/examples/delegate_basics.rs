// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Delegation basics.
//!
//! Builds a small menu, registers one delegated click handler on
//! `ul.menu li.item`, and clicks a `<span>` inside each item. The handler is
//! told which `<li>` it is bound to, not the span that was clicked.
//!
//! Run:
//! - `cargo run -p understory_demos --example delegate_basics`

use understory_delegate::delegator::Delegator;
use understory_delegate::dom::{Document, Element, NodeId};
use understory_delegate::types::{EventType, ListenerBridge, ListenerFlags};

#[derive(Debug)]
struct Click {
    x: i32,
    y: i32,
}

struct PrintBridge;
impl ListenerBridge for PrintBridge {
    fn attach(&self, event_type: &EventType, flags: ListenerFlags) {
        println!("  attach root listener: {event_type} {flags:?}");
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let mut doc = Document::new();
    let body = doc.append(doc.root(), Element::new("body"));
    let ul = doc.append(body, Element::new("ul").with_class("menu"));
    let mut spans = Vec::new();
    for (i, label) in ["Home", "About", "Contact"].into_iter().enumerate() {
        let li = doc.append(ul, Element::new("li").with_id(label).with_class("item"));
        let span = doc.append(li, Element::new("span"));
        doc.append_text(span, label);
        spans.push((i, span));
    }

    println!("== Register ==");
    let delegator: Delegator<NodeId, Click> = Delegator::with_bridge(PrintBridge);
    let subscription = delegator
        .listen("ul.menu li.item", "click", |event: &Click, li: &NodeId| {
            println!("  menu item {li:?} clicked at ({}, {})", event.x, event.y);
            Ok(())
        })
        .expect("valid selector");
    // A second registration for the same type does not attach again.
    delegator
        .listen("body", "click", |_: &Click, _: &NodeId| {
            println!("  body saw the click");
            Ok(())
        })
        .expect("valid selector");

    println!("== Dispatch ==");
    for (i, span) in &spans {
        let event = Click {
            x: 10,
            y: 20 * (*i as i32),
        };
        let summary = delegator.dispatch(&EventType::Click, &doc, *span, &event);
        tracing::info!(
            target_node = ?span,
            fired = summary.fired,
            visited = summary.visited,
            "dispatched"
        );
    }

    println!("== Unregister ==");
    subscription.unregister();
    let (_, span) = spans[0];
    let summary = delegator.dispatch(&EventType::Click, &doc, span, &Click { x: 0, y: 0 });
    println!("  -> {summary:?}");
}
