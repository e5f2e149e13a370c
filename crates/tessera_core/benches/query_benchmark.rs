//! # View vs Group Benchmark
//!
//! Measures the two query strategies over the same data:
//! 1. View - intersection recomputed from the smallest store every pass
//! 2. Group - cached intersection, walked directly
//!
//! Also measures the bookkeeping a live group adds to component churn.

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tessera_core::{Component, EntityId, Registry, RegistryConfig};

const ENTITY_COUNT: u32 = 100_000;

struct Position(f32);
impl Component for Position {}

struct Velocity(f32);
impl Component for Velocity {}

struct Armor(u32);
impl Component for Armor {}

/// Every entity gets a position, one in `stride` also gets velocity and armor.
fn populated(stride: u32) -> (Registry, Vec<EntityId>) {
    let mut registry =
        Registry::with_config(RegistryConfig::with_max_entities(ENTITY_COUNT)).expect("config");
    let mut entities = Vec::with_capacity(ENTITY_COUNT as usize);
    for i in 0..ENTITY_COUNT {
        let e = registry.create().expect("entity");
        registry.add_component(e, Position(0.0)).expect("position");
        if i % stride == 0 {
            registry.add_component(e, Velocity(1.0)).expect("velocity");
            registry.add_component(e, Armor(i)).expect("armor");
        }
        entities.push(e);
    }
    (registry, entities)
}

// =============================================================================
// ITERATION
// =============================================================================

fn bench_iteration(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_iteration");

    for stride in [1, 10, 100] {
        let (mut registry, _) = populated(stride);
        let cached = registry.group::<(Position, Velocity, Armor)>();

        group.bench_with_input(BenchmarkId::new("view", stride), &stride, |b, _| {
            b.iter(|| {
                let mut sum = 0u64;
                registry
                    .view::<(Position, Velocity, Armor)>()
                    .each(|_, _, _, armor| sum += u64::from(armor.0));
                black_box(sum)
            });
        });

        group.bench_with_input(BenchmarkId::new("group", stride), &stride, |b, _| {
            b.iter(|| {
                let mut sum = 0u64;
                cached.each(&registry, |_, _, _, armor| sum += u64::from(armor.0));
                black_box(sum)
            });
        });

        group.bench_with_input(BenchmarkId::new("view_mut", stride), &stride, |b, _| {
            b.iter(|| {
                registry
                    .view_mut::<(Position, Velocity)>()
                    .each(|_, pos, vel| pos.0 += vel.0 * 0.016);
            });
        });
    }

    group.finish();
}

// =============================================================================
// CHURN
// =============================================================================

fn bench_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("component_churn");

    let (mut registry, entities) = populated(1);
    group.bench_function("remove_add_no_group", |b| {
        b.iter(|| {
            for &e in entities.iter().step_by(16) {
                let armor = registry.remove_component::<Armor>(e);
                if let Some(armor) = armor {
                    registry.insert_or_replace_component(e, armor).expect("alive");
                }
            }
        });
    });

    let (mut registry, entities) = populated(1);
    let cached = registry.group::<(Position, Velocity, Armor)>();
    group.bench_function("remove_add_with_group", |b| {
        b.iter(|| {
            for &e in entities.iter().step_by(16) {
                let armor = registry.remove_component::<Armor>(e);
                if let Some(armor) = armor {
                    registry.insert_or_replace_component(e, armor).expect("alive");
                }
            }
            black_box(cached.len())
        });
    });

    group.finish();
}

criterion_group!(benches, bench_iteration, bench_churn);
criterion_main!(benches);
