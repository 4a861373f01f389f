// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use understory_delegate::delegator::Delegator;
use understory_delegate::dom::{Document, Element, NodeId};
use understory_delegate::types::EventType;

/// A chain of `depth` nested divs with alternating classes; returns the deepest node.
fn gen_nested(depth: usize) -> (Document, NodeId) {
    let mut doc = Document::new();
    let mut node = doc.append(doc.root(), Element::new("body"));
    for i in 0..depth {
        let class = if i % 2 == 0 { "even level" } else { "odd level" };
        node = doc.append(node, Element::new("div").with_class(class));
    }
    let leaf = doc.append(node, Element::new("span").with_class("leaf"));
    (doc, leaf)
}

fn gen_delegator(subscribers: usize) -> Delegator<NodeId, ()> {
    let delegator = Delegator::new();
    let rules = ["div.even span", ".odd", "body div.level", "#missing", "div div div"];
    for i in 0..subscribers {
        let rule = rules[i % rules.len()];
        let _ = delegator.listen(rule, "click", |_: &(), node: &NodeId| {
            black_box(node);
            Ok(())
        });
    }
    delegator
}

fn bench_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch");
    for &depth in &[8_usize, 32, 128] {
        let (doc, leaf) = gen_nested(depth);
        for &subs in &[1_usize, 16, 256] {
            let delegator = gen_delegator(subs);
            group.throughput(Throughput::Elements(subs as u64));
            group.bench_function(format!("depth{depth}_subs{subs}"), |b| {
                b.iter(|| {
                    let summary = delegator.dispatch(&EventType::Click, &doc, leaf, &());
                    black_box(summary);
                });
            });
        }
    }
    group.finish();
}

fn bench_listen(c: &mut Criterion) {
    let mut group = c.benchmark_group("listen");
    for &n in &[64_usize, 1024] {
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("register_unregister_n{n}"), |b| {
            b.iter_batched(
                Delegator::<NodeId, ()>::new,
                |delegator| {
                    let subs: Vec<_> = (0..n)
                        .filter_map(|_| {
                            delegator
                                .listen("ul.menu li.item", "click", |_: &(), _: &NodeId| Ok(()))
                                .ok()
                        })
                        .collect();
                    for sub in &subs {
                        sub.unregister();
                    }
                    black_box(delegator.subscriber_count(&EventType::Click));
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_dispatch, bench_listen);
criterion_main!(benches);
