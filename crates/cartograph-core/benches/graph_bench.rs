//! # Graph Benchmarks
//!
//! Performance benchmarks for cartograph-core path queries.
//!
//! Run with: `cargo bench -p cartograph-core`

use cartograph_core::{Cost, CostRegistry, MapFormat, MinHeap, Room, RoomGraph, RoomId};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

/// Square grid of `side * side` rooms, four-way connected, uniform cost.
fn create_grid(side: u32) -> RoomGraph {
    let id = |x: u32, y: u32| RoomId(y * side + x);
    let mut rooms = Vec::with_capacity((side * side) as usize);
    for y in 0..side {
        for x in 0..side {
            let mut room = Room::new(id(x, y));
            if x + 1 < side {
                room.add_fixed_exit(id(x + 1, y), "east", Cost(200));
            }
            if x > 0 {
                room.add_fixed_exit(id(x - 1, y), "west", Cost(200));
            }
            if y + 1 < side {
                room.add_fixed_exit(id(x, y + 1), "south", Cost(300));
            }
            if y > 0 {
                room.add_fixed_exit(id(x, y - 1), "north", Cost(300));
            }
            if (x + y) % 17 == 0 {
                room.add_tag("bank");
            }
            rooms.push(room);
        }
    }
    RoomGraph::from_rooms(rooms)
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_heap(c: &mut Criterion) {
    c.bench_function("heap_push_pop_10000", |b| {
        b.iter(|| {
            let mut heap = MinHeap::with_capacity(10_000);
            for i in 0..10_000u64 {
                heap.push(i.wrapping_mul(2_654_435_761) % 10_007, i);
            }
            while let Some(entry) = heap.pop() {
                black_box(entry);
            }
        });
    });
}

fn bench_dijkstra(c: &mut Criterion) {
    let mut group = c.benchmark_group("dijkstra_full");
    let costs = CostRegistry::new();

    for side in [10u32, 50, 100].iter() {
        let graph = create_grid(*side);
        group.bench_with_input(BenchmarkId::from_parameter(side * side), &graph, |b, graph| {
            b.iter(|| black_box(graph.dijkstra(RoomId(0), None, &costs)));
        });
    }

    group.finish();
}

fn bench_path_to(c: &mut Criterion) {
    let graph = create_grid(100);
    let costs = CostRegistry::new();
    let far_corner = RoomId(100 * 100 - 1);

    c.bench_function("path_to_far_corner_10000", |b| {
        b.iter(|| black_box(graph.path_to(RoomId(0), far_corner, &costs)));
    });
}

fn bench_nearest_by_tag(c: &mut Criterion) {
    let graph = create_grid(100);
    let costs = CostRegistry::new();
    let center = RoomId(50 * 100 + 50);

    c.bench_function("find_nearest_by_tag_10000", |b| {
        b.iter(|| black_box(graph.find_nearest_by_tag(center, "bank", &costs)));
    });
}

fn bench_json_decode(c: &mut Criterion) {
    let rooms: Vec<Room> = create_grid(50).rooms().cloned().collect();
    let bytes = MapFormat::Json.encode(&rooms).expect("encode");

    c.bench_function("json_decode_2500", |b| {
        b.iter(|| black_box(MapFormat::Json.decode(&bytes)));
    });
}

criterion_group!(
    benches,
    bench_heap,
    bench_dijkstra,
    bench_path_to,
    bench_nearest_by_tag,
    bench_json_decode
);
criterion_main!(benches);
