// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use understory_selector::{ClassMatcher, ElementData, compile, split_selector_list};

const SELECTORS: &[&str] = &[
    "div",
    "#main",
    ".item",
    "li#x.item.active",
    "ul.menu li.item",
    "body div#main.outer ul.menu li.item span",
    "  nav   ul   li  a.link  ",
];

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile");
    group.throughput(Throughput::Elements(SELECTORS.len() as u64));
    group.bench_function("mixed", |b| {
        b.iter(|| {
            for s in SELECTORS {
                let _ = black_box(compile(black_box(s)));
            }
        });
    });
    let list = SELECTORS.join(", ");
    group.bench_function("selector_list", |b| {
        b.iter(|| {
            let depth: usize = split_selector_list(black_box(&list))
                .filter_map(|s| compile(s).ok())
                .map(|chain| chain.depth())
                .sum();
            black_box(depth);
        });
    });
    group.finish();
}

fn bench_class_match(c: &mut Criterion) {
    let mut group = c.benchmark_group("class_match");
    let matcher = ClassMatcher::new();
    let element = ElementData {
        tag_name: "LI",
        id: Some("x"),
        class_name: "nav-item item item-active selected highlighted",
    };
    group.bench_function("hit_warm", |b| {
        b.iter(|| black_box(matcher.has_class(black_box(element.class_name), "item")));
    });
    group.bench_function("miss_warm", |b| {
        b.iter(|| black_box(matcher.has_class(black_box(element.class_name), "active")));
    });
    for n in [8_usize, 64] {
        let names: Vec<String> = (0..n).map(|i| format!("c{i}")).collect();
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("distinct_names_n{n}"), |b| {
            b.iter(|| {
                let hits = names
                    .iter()
                    .filter(|name| matcher.has_class(element.class_name, name))
                    .count();
                black_box(hits);
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_compile, bench_class_match);
criterion_main!(benches);
