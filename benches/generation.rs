use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::sync::Arc;
use tilestitch::{
    tiles, BehaviorTable, Chunk, ChunkLevelGenerator, ChunkRepository, EntityKind,
    EntityTemplate, FrequencySampler, GenerationConfig, Grid, LevelArchive, LevelType,
};

fn repository(behaviors: &Arc<BehaviorTable>) -> ChunkRepository {
    let mut repository = ChunkRepository::new();
    for (i, rise) in [0, 1, 2].into_iter().enumerate() {
        let mut grid = Grid::new(8, 6, Arc::clone(behaviors)).expect("valid chunk size");
        for x in 0..8 {
            grid.set(x, 4, tiles::GROUND);
            grid.set(x, 5, tiles::GROUND);
        }
        if i == 1 {
            grid.set_entity(4, 3, Some(EntityTemplate::new(EntityKind::Goomba)));
        }
        grid.set(0, 3, tiles::ANCHOR);
        grid.set(7, 3 - rise, tiles::ANCHOR);
        repository.add(LevelType::Overground, Chunk::from_grid(format!("c{i}"), grid));
    }
    repository
}

fn bench_generate_level(c: &mut Criterion) {
    let behaviors = Arc::new(BehaviorTable::standard());
    let generator = ChunkLevelGenerator::new(Arc::new(repository(&behaviors)), behaviors);

    c.bench_function("generate_level_128x15", |b| {
        let mut seed = 0u64;
        b.iter(|| {
            seed += 1;
            black_box(generator.generate_level(&GenerationConfig::new(seed)))
        })
    });
}

fn bench_sampler(c: &mut Criterion) {
    c.bench_function("sampler_draw_below", |b| {
        let mut sampler = FrequencySampler::new(64, 7);
        b.iter(|| black_box(sampler.draw_below(48)))
    });
}

fn bench_level_stream(c: &mut Criterion) {
    let behaviors = Arc::new(BehaviorTable::standard());
    let generator =
        ChunkLevelGenerator::new(Arc::new(repository(&behaviors)), Arc::clone(&behaviors));
    let level = generator
        .generate_level(&GenerationConfig::new(15))
        .expect("level generates");

    c.bench_function("encode_decode_level", |b| {
        b.iter(|| {
            let archive = LevelArchive::from_grid(black_box(&level)).expect("encodable");
            black_box(archive.to_grid(Arc::clone(&behaviors)))
        })
    });
}

criterion_group!(benches, bench_generate_level, bench_sampler, bench_level_stream);
criterion_main!(benches);
