// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end delegation through `Delegator` and the reference `Document`.

use std::sync::{Arc, Mutex};

use understory_delegate::delegator::{Delegator, Subscription};
use understory_delegate::dom::{Document, Element, NodeId};
use understory_delegate::error::{BoxError, DelegateError, error_chain};
use understory_delegate::types::{
    CompileMode, DelegatorConfig, EventType, ListenerBridge, ListenerFlags, NoBridge,
};

#[derive(Clone, Debug, PartialEq)]
struct Event {
    name: &'static str,
}

const CLICK: Event = Event { name: "click" };

type Hits = Arc<Mutex<Vec<(&'static str, NodeId)>>>;

fn record(
    hits: &Hits,
    label: &'static str,
) -> impl Fn(&Event, &NodeId) -> Result<(), BoxError> + Send + Sync + 'static {
    let hits = Arc::clone(hits);
    move |_: &Event, node: &NodeId| {
        hits.lock().unwrap().push((label, *node));
        Ok(())
    }
}

#[derive(Clone, Default)]
struct RecordingBridge {
    attached: Arc<Mutex<Vec<(EventType, ListenerFlags)>>>,
}

impl ListenerBridge for RecordingBridge {
    fn attach(&self, event_type: &EventType, flags: ListenerFlags) {
        self.attached
            .lock()
            .unwrap()
            .push((event_type.clone(), flags));
    }
}

struct Page {
    doc: Document,
    div: NodeId,
    ul: NodeId,
    li: NodeId,
    span: NodeId,
}

/// `<div><ul class="menu"><li class="item"><span/></li></ul></div>`
fn menu_page() -> Page {
    let mut doc = Document::new();
    let body = doc.append(doc.root(), Element::new("body"));
    let div = doc.append(body, Element::new("div"));
    let ul = doc.append(div, Element::new("ul").with_class("menu"));
    let li = doc.append(ul, Element::new("li").with_class("item"));
    let span = doc.append(li, Element::new("span"));
    Page {
        doc,
        div,
        ul,
        li,
        span,
    }
}

#[test]
fn menu_click_binds_list_item() {
    let page = menu_page();
    let delegator = Delegator::new();
    let hits = Hits::default();
    delegator
        .listen("ul.menu li.item", "click", record(&hits, "h"))
        .unwrap();

    let summary = delegator.dispatch(&EventType::Click, &page.doc, page.span, &CLICK);
    assert_eq!(summary.fired, 1);
    assert!(!summary.aborted);
    assert_eq!(*hits.lock().unwrap(), vec![("h", page.li)]);
    assert_ne!(page.li, page.span);
    assert_ne!(page.li, page.ul);
}

#[test]
fn comma_list_fires_once_for_node_matching_one_alternative() {
    let mut doc = Document::new();
    let panel = doc.append(doc.root(), Element::new("section").with_id("panel"));
    let inner = doc.append(panel, Element::new("p"));
    let widget = doc.append(doc.root(), Element::new("div").with_class("widget"));

    let delegator = Delegator::new();
    let hits = Hits::default();
    delegator
        .listen("#panel, .widget", "mouseover", record(&hits, "h"))
        .unwrap();

    let over = Event { name: "mouseover" };
    delegator.dispatch(&EventType::MouseOver, &doc, inner, &over);
    delegator.dispatch(&EventType::MouseOver, &doc, widget, &over);
    assert_eq!(*hits.lock().unwrap(), vec![("h", panel), ("h", widget)]);
}

#[test]
fn node_matching_both_alternatives_fires_once_per_alternative() {
    let mut doc = Document::new();
    let both = doc.append(
        doc.root(),
        Element::new("div").with_id("panel").with_class("widget"),
    );
    let child = doc.append(both, Element::new("span"));

    let delegator = Delegator::new();
    let hits = Hits::default();
    let sub = delegator
        .listen("#panel, .widget", "mouseover", record(&hits, "h"))
        .unwrap();
    assert_eq!(sub.selectors().collect::<Vec<_>>(), vec!["#panel", ".widget"]);

    let over = Event { name: "mouseover" };
    let summary = delegator.dispatch(&EventType::MouseOver, &doc, child, &over);
    // Each alternative is its own subscriber sharing the handler.
    assert_eq!(summary.fired, 2);
    assert_eq!(*hits.lock().unwrap(), vec![("h", both), ("h", both)]);
}

#[test]
fn refused_cyclic_reparent_keeps_dispatch_finite() {
    let mut doc = Document::new();
    let a = doc.append(doc.root(), Element::new("div"));
    let c = doc.append(a, Element::new("span"));
    doc.reparent(a, c);

    let delegator = Delegator::new();
    let hits = Hits::default();
    delegator.listen("table", "click", record(&hits, "t")).unwrap();
    let summary = delegator.dispatch(&EventType::Click, &doc, c, &CLICK);
    assert_eq!(summary.visited, 3);
    assert_eq!(summary.fired, 0);
}

#[test]
fn descendant_selector_needs_strict_ancestor() {
    let page = menu_page();
    let delegator = Delegator::new();
    let hits = Hits::default();
    delegator.listen("div div", "click", record(&hits, "nested")).unwrap();
    delegator.listen("div span", "click", record(&hits, "span")).unwrap();

    delegator.dispatch(&EventType::Click, &page.doc, page.span, &CLICK);
    assert_eq!(*hits.lock().unwrap(), vec![("span", page.span)]);
}

#[test]
fn single_token_matches_target_or_ancestor() {
    let page = menu_page();
    let delegator = Delegator::new();
    let hits = Hits::default();
    delegator.listen("div", "click", record(&hits, "div")).unwrap();

    delegator.dispatch(&EventType::Click, &page.doc, page.span, &CLICK);
    delegator.dispatch(&EventType::Click, &page.doc, page.div, &CLICK);
    assert_eq!(
        *hits.lock().unwrap(),
        vec![("div", page.div), ("div", page.div)]
    );
}

#[test]
fn independent_subscribers_fire_once_regardless_of_order() {
    for flip in [false, true] {
        let page = menu_page();
        let delegator = Delegator::new();
        let hits = Hits::default();
        let rules = if flip {
            [("li", "li.item"), ("ul", "ul.menu")]
        } else {
            [("ul", "ul.menu"), ("li", "li.item")]
        };
        for (label, rule) in rules {
            delegator.listen(rule, "click", record(&hits, label)).unwrap();
        }
        delegator.dispatch(&EventType::Click, &page.doc, page.span, &CLICK);

        // Completion order follows depth, not registration.
        assert_eq!(
            *hits.lock().unwrap(),
            vec![("li", page.li), ("ul", page.ul)]
        );
    }
}

#[test]
fn class_match_is_token_exact() {
    let mut doc = Document::new();
    let ab = doc.append(doc.root(), Element::new("p").with_class("ab xa"));
    let a = doc.append(doc.root(), Element::new("p").with_class("xa a"));

    let delegator = Delegator::new();
    let hits = Hits::default();
    delegator.listen(".a", "click", record(&hits, "a")).unwrap();
    delegator.dispatch(&EventType::Click, &doc, ab, &CLICK);
    delegator.dispatch(&EventType::Click, &doc, a, &CLICK);
    assert_eq!(*hits.lock().unwrap(), vec![("a", a)]);
}

#[test]
fn unregister_inside_own_handler() {
    let page = menu_page();
    let delegator: Delegator<NodeId, Event> = Delegator::new();
    let hits = Hits::default();
    let slot: Arc<Mutex<Option<Subscription<NodeId, Event>>>> = Arc::default();

    let handler_slot = Arc::clone(&slot);
    let handler_hits = Arc::clone(&hits);
    let sub = delegator
        .listen("li", "click", move |_, node| {
            handler_hits.lock().unwrap().push(("once", *node));
            if let Some(sub) = handler_slot.lock().unwrap().as_ref() {
                sub.unregister();
            }
            Ok(())
        })
        .unwrap();
    *slot.lock().unwrap() = Some(sub);

    let first = delegator.dispatch(&EventType::Click, &page.doc, page.span, &CLICK);
    let second = delegator.dispatch(&EventType::Click, &page.doc, page.span, &CLICK);
    assert_eq!(first.fired, 1);
    assert_eq!(second.fired, 0);
    assert_eq!(*hits.lock().unwrap(), vec![("once", page.li)]);
    assert_eq!(delegator.subscriber_count(&EventType::Click), 0);
    assert!(!slot.lock().unwrap().as_ref().unwrap().is_active());
}

#[test]
fn unregister_during_dispatch_skips_pending_subscriber() {
    let page = menu_page();
    let delegator: Delegator<NodeId, Event> = Delegator::new();
    let hits = Hits::default();
    let victim_slot: Arc<Mutex<Option<Subscription<NodeId, Event>>>> = Arc::default();

    let slot = Arc::clone(&victim_slot);
    delegator
        .listen("li", "click", move |_, _| {
            if let Some(sub) = slot.lock().unwrap().as_ref() {
                sub.unregister();
            }
            Ok(())
        })
        .unwrap();
    let victim = delegator
        .listen("div", "click", record(&hits, "victim"))
        .unwrap();
    *victim_slot.lock().unwrap() = Some(victim);

    delegator.dispatch(&EventType::Click, &page.doc, page.span, &CLICK);
    assert!(hits.lock().unwrap().is_empty());
}

#[test]
fn listen_during_dispatch_applies_to_next_event_only() {
    let page = menu_page();
    let delegator: Delegator<NodeId, Event> = Delegator::new();
    let hits = Hits::default();

    let registrar = delegator.clone();
    let late_hits = Arc::clone(&hits);
    let added = Arc::new(Mutex::new(false));
    delegator
        .listen("span", "click", move |_, _| {
            let mut added = added.lock().unwrap();
            if !*added {
                *added = true;
                registrar.listen("ul", "click", record(&late_hits, "late"))?;
            }
            Ok(())
        })
        .unwrap();

    delegator.dispatch(&EventType::Click, &page.doc, page.span, &CLICK);
    assert!(hits.lock().unwrap().is_empty());
    delegator.dispatch(&EventType::Click, &page.doc, page.span, &CLICK);
    assert_eq!(*hits.lock().unwrap(), vec![("late", page.ul)]);
}

#[test]
fn bridge_attaches_once_per_event_type() {
    let bridge = RecordingBridge::default();
    let delegator: Delegator<NodeId, Event> = Delegator::with_bridge(bridge.clone());
    let hits = Hits::default();
    delegator.listen("a", "click", record(&hits, "a")).unwrap();
    delegator.listen("b, c", "click", record(&hits, "b")).unwrap();
    let sub = delegator.listen("d", "keyup", record(&hits, "d")).unwrap();
    sub.unregister();
    delegator.listen("e", "keyup", record(&hits, "e")).unwrap();

    let attached = bridge.attached.lock().unwrap().clone();
    assert_eq!(
        attached,
        vec![
            (EventType::Click, ListenerFlags::CAPTURE),
            (EventType::KeyUp, ListenerFlags::CAPTURE),
        ]
    );
    assert_eq!(delegator.subscriber_count(&EventType::Click), 3);
    assert_eq!(delegator.event_types().len(), 2);
}

#[test]
fn focus_is_filed_as_focusin_when_aliased() {
    let bridge = RecordingBridge::default();
    let config = DelegatorConfig::default()
        .with_flags(ListenerFlags::CAPTURE | ListenerFlags::FOCUS_IN_OUT);
    let delegator: Delegator<NodeId, Event> = Delegator::with_config(bridge.clone(), config);
    let page = menu_page();
    let hits = Hits::default();

    let sub = delegator.listen("li", "focus", record(&hits, "f")).unwrap();
    assert_eq!(sub.event_type(), &EventType::FocusIn);
    assert_eq!(sub.selectors().collect::<Vec<_>>(), vec!["li"]);

    let focus = Event { name: "focusin" };
    delegator.dispatch(&EventType::Focus, &page.doc, page.span, &focus);
    assert!(hits.lock().unwrap().is_empty());
    delegator.dispatch(&EventType::FocusIn, &page.doc, page.span, &focus);
    assert_eq!(*hits.lock().unwrap(), vec![("f", page.li)]);
    assert_eq!(bridge.attached.lock().unwrap()[0].0, EventType::FocusIn);
}

#[test]
fn eager_mode_rejects_malformed_selector() {
    let bridge = RecordingBridge::default();
    let delegator: Delegator<NodeId, Event> = Delegator::with_bridge(bridge.clone());
    let hits = Hits::default();
    let err = delegator
        .listen("li.item, span.", "click", record(&hits, "bad"))
        .unwrap_err();
    assert_eq!(err.selector(), "span.");
    assert_eq!(delegator.subscriber_count(&EventType::Click), 0);
    assert!(bridge.attached.lock().unwrap().is_empty());
}

#[test]
fn lazy_mode_reports_malformed_selector_on_first_dispatch() {
    let config = DelegatorConfig::default().with_compile_mode(CompileMode::Lazy);
    let delegator: Delegator<NodeId, Event> = Delegator::with_config(NoBridge, config);
    let reported = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&reported);
    delegator.set_error_sink(move |err| {
        if let DelegateError::Selector { selector, .. } = err {
            sink.lock().unwrap().push(selector.clone());
        }
    });

    let page = menu_page();
    let hits = Hits::default();
    delegator
        .listen("li.item, span.", "click", record(&hits, "h"))
        .unwrap();
    assert!(reported.lock().unwrap().is_empty());

    delegator.dispatch(&EventType::Click, &page.doc, page.span, &CLICK);
    delegator.dispatch(&EventType::Click, &page.doc, page.span, &CLICK);
    assert_eq!(*reported.lock().unwrap(), vec!["span.".to_owned()]);
    assert_eq!(
        *hits.lock().unwrap(),
        vec![("h", page.li), ("h", page.li)]
    );
}

#[test]
fn handler_error_goes_to_sink_and_walk_continues() {
    let page = menu_page();
    let delegator: Delegator<NodeId, Event> = Delegator::new();
    let errors = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&errors);
    delegator.set_error_sink(move |err| sink.lock().unwrap().push(error_chain(err)));

    let hits = Hits::default();
    delegator
        .listen("span", "click", |event: &Event, _| {
            Err(format!("cannot handle {}", event.name).into())
        })
        .unwrap();
    delegator.listen("ul", "click", record(&hits, "ul")).unwrap();

    let summary = delegator.dispatch(&EventType::Click, &page.doc, page.span, &CLICK);
    assert_eq!(summary.fired, 2);
    assert_eq!(summary.handler_errors, 1);
    assert_eq!(*hits.lock().unwrap(), vec![("ul", page.ul)]);
    let errors = errors.lock().unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0],
        "handler for `span` on `click` failed: handler returned an error: cannot handle click"
    );
}

#[test]
fn opaque_boundary_aborts_quietly() {
    let mut page = menu_page();
    page.doc.set_opaque(page.ul, true);
    let delegator: Delegator<NodeId, Event> = Delegator::new();
    let errors = Arc::new(Mutex::new(0_usize));
    let sink = Arc::clone(&errors);
    delegator.set_error_sink(move |_| *sink.lock().unwrap() += 1);

    let hits = Hits::default();
    delegator.listen("li", "click", record(&hits, "li")).unwrap();
    delegator.listen("div", "click", record(&hits, "div")).unwrap();

    let summary = delegator.dispatch(&EventType::Click, &page.doc, page.span, &CLICK);
    assert!(summary.aborted);
    assert_eq!(*hits.lock().unwrap(), vec![("li", page.li)]);
    assert_eq!(*errors.lock().unwrap(), 0);
}

#[test]
fn unrelated_event_type_is_ignored() {
    let page = menu_page();
    let delegator: Delegator<NodeId, Event> = Delegator::new();
    let hits = Hits::default();
    delegator.listen("li", "click", record(&hits, "li")).unwrap();
    let summary = delegator.dispatch(&EventType::KeyDown, &page.doc, page.span, &CLICK);
    assert_eq!(summary.visited, 0);
    assert!(hits.lock().unwrap().is_empty());
}

#[test]
fn text_node_target_bubbles_to_element() {
    let mut page = menu_page();
    let text = page.doc.append_text(page.span, "Home");
    let delegator: Delegator<NodeId, Event> = Delegator::new();
    let hits = Hits::default();
    delegator
        .listen("ul.menu li.item", "click", record(&hits, "h"))
        .unwrap();
    delegator.dispatch(&EventType::Click, &page.doc, text, &CLICK);
    assert_eq!(*hits.lock().unwrap(), vec![("h", page.li)]);
}

#[test]
fn independent_delegators_do_not_share_subscribers() {
    let page = menu_page();
    let a: Delegator<NodeId, Event> = Delegator::new();
    let b: Delegator<NodeId, Event> = Delegator::new();
    let hits = Hits::default();
    a.listen("li", "click", record(&hits, "a")).unwrap();
    let summary = b.dispatch(&EventType::Click, &page.doc, page.span, &CLICK);
    assert_eq!(summary.fired, 0);
    assert!(hits.lock().unwrap().is_empty());
}
