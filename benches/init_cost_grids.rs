//! Measure initialising the cost grid of a category over a large map
//!

use bevy_region_pathing_plugin::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

/// Registry with a single walking category over uniform terrain
fn build_registry() -> (PathingRegistry, CategoryId, TerrainId) {
	let mut builder = PathingRegistryBuilder::new();
	let ground = builder.add_terrain(TerrainDef {
		name: "ground".to_string(),
		path_cost: 1,
		passable: true,
		tags: vec![],
	});
	let category = builder.add_category(CategoryDef::new("walker"));
	(builder.build(), category, ground)
}

/// Create the full cache stack of one category from fresh mirrors
fn init_cost_grids(map_length: u32, map_depth: u32) {
	let (registry, category, ground) = build_registry();
	let dimensions = MapDimensions::new(map_length, map_depth);
	let terrain = TerrainGrid::new(dimensions, ground);
	let things = ThingGrid::new(dimensions);
	let _stack = CategoryPathing::new(&registry, category, &terrain, &things);
}

pub fn criterion_benchmark(c: &mut Criterion) {
	let mut group = c.benchmark_group("data_initialisation");
	group.significance_level(0.05).sample_size(100);
	group.bench_function("init_category_cost_grid", |b| {
		b.iter(|| init_cost_grids(black_box(1000), black_box(1000)))
	});
	group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
