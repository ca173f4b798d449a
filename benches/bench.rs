use criterion::{Criterion, criterion_group, criterion_main};
use sat_sampler::analysis::atomic_sets::atomic_sets;
use sat_sampler::analysis::backbone::core_dead;
use sat_sampler::mig::builder::{MigConfig, build};
use sat_sampler::sat::cnf::Cnf;
use sat_sampler::sat::oracle::Oracle;
use sat_sampler::twise::{Deduce, TWiseConfig, TWiseSampler};
use std::hint::black_box;
use std::time::Duration;

/// A synthetic feature model: a tree of optional and alternative features with a few
/// cross-tree constraints drawn from a seeded generator.
fn feature_model(features: usize, seed: u64) -> Cnf {
    let mut rng = fastrand::Rng::with_seed(seed);
    let mut clauses: Vec<Vec<i32>> = vec![vec![1]];
    let top = i32::try_from(features).unwrap_or(i32::MAX);

    let mut next = 2;
    let mut parent = 1;
    while next <= top {
        let children: Vec<i32> = (next..=top.min(next + rng.i32(1..4))).collect();
        next += i32::try_from(children.len()).unwrap_or(1);
        for &child in &children {
            clauses.push(vec![-child, parent]);
        }
        if children.len() > 1 && rng.bool() {
            let mut group = vec![-parent];
            group.extend(&children);
            clauses.push(group);
            for (i, &a) in children.iter().enumerate() {
                for &b in &children[i + 1..] {
                    clauses.push(vec![-a, -b]);
                }
            }
        } else if rng.bool() {
            clauses.push(vec![-parent, children[0]]);
        }
        parent = rng.i32(parent..next);
    }

    let mut cnf = Cnf::from_clauses(features, clauses).unwrap();
    for _ in 0..features / 10 {
        let a = rng.i32(2..=top);
        let b = rng.i32(2..=top);
        if a == b {
            continue;
        }
        let mut candidate = cnf.clone();
        candidate.add_clause(vec![-a, if rng.bool() { b } else { -b }]).unwrap();
        if Oracle::new(&candidate).unwrap().solve().is_satisfiable() {
            cnf = candidate;
        }
    }
    cnf
}

fn bench_analysis(c: &mut Criterion) {
    let cnf = feature_model(200, 7);

    let mut group = c.benchmark_group("analysis");
    group.sample_size(20);
    group.measurement_time(Duration::from_secs(10));

    group.bench_function("core/dead", |b| {
        b.iter(|| {
            let mut oracle = Oracle::new(&cnf).unwrap();
            let mut rng = fastrand::Rng::with_seed(1);
            black_box(core_dead(&mut oracle, &mut rng, None).unwrap());
        });
    });

    group.bench_function("atomic sets", |b| {
        b.iter(|| {
            let mut oracle = Oracle::new(&cnf).unwrap();
            let mut rng = fastrand::Rng::with_seed(1);
            black_box(atomic_sets(&mut oracle, &mut rng, None));
        });
    });

    group.finish();
}

fn bench_mig(c: &mut Criterion) {
    let cnf = feature_model(200, 7);

    let mut group = c.benchmark_group("mig - build");
    group.sample_size(20);
    group.measurement_time(Duration::from_secs(10));

    group.bench_function("clauses only", |b| {
        let config = MigConfig::default();
        b.iter(|| black_box(build(&cnf, &config).unwrap()));
    });

    group.bench_function("detect strong", |b| {
        let config = MigConfig {
            detect_strong: true,
            ..MigConfig::default()
        };
        b.iter(|| black_box(build(&cnf, &config).unwrap()));
    });

    group.finish();
}

fn bench_twise(c: &mut Criterion) {
    let cnf = feature_model(60, 11);

    let mut group = c.benchmark_group("twise - deduce");
    group.sample_size(10);
    group.measurement_time(Duration::from_secs(20));

    for (name, deduce) in [("none", Deduce::None), ("dp", Deduce::Dp), ("ac", Deduce::Ac)] {
        group.bench_function(name, |b| {
            let sampler = TWiseSampler::new(TWiseConfig {
                create_deduce: deduce,
                ..TWiseConfig::default()
            });
            b.iter(|| black_box(sampler.sample(&cnf).unwrap()));
        });
    }

    group.bench_function("dp without graph", |b| {
        let sampler = TWiseSampler::new(TWiseConfig {
            use_mig: false,
            ..TWiseConfig::default()
        });
        b.iter(|| black_box(sampler.sample(&cnf).unwrap()));
    });

    group.finish();
}

criterion_group!(benches, bench_analysis, bench_mig, bench_twise);
criterion_main!(benches);
