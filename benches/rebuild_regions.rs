//! Measure a full region partition rebuild over a map scattered with walls
//!

use bevy_region_pathing_plugin::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

/// Cost grid with an impassable cell at every 7th diagonal step
fn build_cost_grid(dimensions: MapDimensions) -> PathCostGrid {
	let mut cost = PathCostGrid::new(dimensions);
	for cell in dimensions.all_cells() {
		if (cell.get_x() + cell.get_z() * 3) % 7 == 0 {
			cost.set_cost(cell, IMPASSABLE_COST);
		}
	}
	cost
}

/// Partition the whole map from a blanket dirty set
fn rebuild_regions(map_length: u32, map_depth: u32) {
	let dimensions = MapDimensions::new(map_length, map_depth);
	let cost = build_cost_grid(dimensions);
	let mut grid = RegionGrid::new(dimensions);
	let dirty: Vec<Cell> = dimensions.all_cells().collect();
	grid.rebuild(&cost, &dirty);
}

pub fn criterion_benchmark(c: &mut Criterion) {
	let mut group = c.benchmark_group("partition_rebuild");
	group.significance_level(0.05).sample_size(50);
	group.bench_function("rebuild_scattered_500", |b| {
		b.iter(|| rebuild_regions(black_box(500), black_box(500)))
	});
	group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
