use criterion::{Criterion, black_box, criterion_group, criterion_main};
use small_flat_collections::{SmallFlatMap, SmallUnorderedFlatMap, StaticUnorderedFlatMultimap};
use std::collections::{BTreeMap, HashMap};

fn bench_flat_map(c: &mut Criterion) {
    let n = 8;
    {
        let mut group = c.benchmark_group("BTreeMap vs SmallFlatMap (Insert 8)");
        group.bench_function("std::collections::BTreeMap", |b| {
            b.iter(|| {
                let mut m = BTreeMap::new();
                for i in 0..n {
                    m.insert(black_box(i as i32), black_box(i as i32));
                }
                m
            })
        });

        group.bench_function("SmallFlatMap<i32, i32, 8>", |b| {
            b.iter(|| {
                let mut m: SmallFlatMap<i32, i32, 8> = SmallFlatMap::new();
                for i in 0..n {
                    m.insert(black_box(i as i32), black_box(i as i32));
                }
                m
            })
        });
        group.finish();
    }

    {
        let mut group = c.benchmark_group("BTreeMap vs SmallFlatMap (Get 8)");
        let mut m_std = BTreeMap::new();
        let mut m_flat: SmallFlatMap<i32, i32, 8> = SmallFlatMap::new();
        for i in 0..n {
            m_std.insert(i as i32, i as i32);
            m_flat.insert(i as i32, i as i32);
        }

        group.bench_function("std::collections::BTreeMap", |b| {
            b.iter(|| {
                for i in 0..n {
                    black_box(m_std.get(&black_box(i as i32)));
                }
            })
        });

        group.bench_function("SmallFlatMap<i32, i32, 8>", |b| {
            b.iter(|| {
                for i in 0..n {
                    black_box(m_flat.get(&black_box(i as i32)));
                }
            })
        });
        group.finish();
    }

    {
        let mut group = c.benchmark_group("SmallFlatMap (Spill 8 -> 32)");
        group.bench_function("SmallFlatMap<i32, i32, 8>", |b| {
            b.iter(|| {
                let mut m: SmallFlatMap<i32, i32, 8> = SmallFlatMap::new();
                for i in (0..32).rev() {
                    m.insert(black_box(i), black_box(i));
                }
                m
            })
        });
        group.finish();
    }
}

fn bench_unordered_map(c: &mut Criterion) {
    let n = 8;
    {
        let mut group = c.benchmark_group("HashMap vs SmallUnorderedFlatMap (Insert 8)");
        group.bench_function("std::collections::HashMap", |b| {
            b.iter(|| {
                let mut m = HashMap::with_capacity(n);
                for i in 0..n {
                    m.insert(black_box(i as i32), black_box(i as i32));
                }
                m
            })
        });

        group.bench_function("SmallUnorderedFlatMap<i32, i32, 8>", |b| {
            b.iter(|| {
                let mut m: SmallUnorderedFlatMap<i32, i32, 8> = SmallUnorderedFlatMap::new();
                for i in 0..n {
                    m.insert(black_box(i as i32), black_box(i as i32));
                }
                m
            })
        });

        group.bench_function("StaticUnorderedFlatMultimap<i32, i32, 8>", |b| {
            b.iter(|| {
                let mut m: StaticUnorderedFlatMultimap<i32, i32, 8> =
                    StaticUnorderedFlatMultimap::new();
                for i in 0..n {
                    let _ = m.insert(black_box(i as i32), black_box(i as i32));
                }
                m
            })
        });
        group.finish();
    }

    {
        let mut group = c.benchmark_group("HashMap vs SmallUnorderedFlatMap (Get 8)");
        let mut m_std = HashMap::new();
        let mut m_flat: SmallUnorderedFlatMap<i32, i32, 8> = SmallUnorderedFlatMap::new();
        for i in 0..n {
            m_std.insert(i as i32, i as i32);
            m_flat.insert(i as i32, i as i32);
        }

        group.bench_function("std::collections::HashMap", |b| {
            b.iter(|| {
                for i in 0..n {
                    black_box(m_std.get(&black_box(i as i32)));
                }
            })
        });

        group.bench_function("SmallUnorderedFlatMap<i32, i32, 8>", |b| {
            b.iter(|| {
                for i in 0..n {
                    black_box(m_flat.get(&black_box(i as i32)));
                }
            })
        });
        group.finish();
    }
}

criterion_group!(benches, bench_flat_map, bench_unordered_map);
criterion_main!(benches);
