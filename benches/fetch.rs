use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use fetchbench::benchmarks::catalog::{default_implementations, default_repositories, workload_matrix};
use fetchbench::benchmarks::{repo_dir_name, BenchmarkState, SetupOptions};
use std::time::{Duration, Instant};

/// Comma separated repository sources overriding the built-in catalog
const REPOSITORIES_ENV: &str = "FETCHBENCH_REPOSITORIES";

fn repositories() -> Vec<String> {
    match std::env::var(REPOSITORIES_ENV) {
        Ok(value) if !value.trim().is_empty() => value
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        _ => default_repositories(),
    }
}

fn bench_fetch(c: &mut Criterion) {
    let options = SetupOptions::default();
    let mut group = c.benchmark_group("fetch");
    group.sample_size(10);

    for parameter in workload_matrix(&default_implementations(), &repositories()) {
        // Skip workloads that cannot even be provisioned
        match BenchmarkState::setup(&parameter, &options) {
            Ok(state) => {
                state.teardown();
            }
            Err(e) => {
                eprintln!("Skipping {parameter}: {}", e.detailed());
                continue;
            }
        }

        let id = BenchmarkId::new(
            parameter.implementation.clone(),
            repo_dir_name(&parameter.repository),
        );
        group.bench_function(id, |b| {
            b.iter_custom(|iters| {
                let mut total = Duration::ZERO;
                for _ in 0..iters {
                    let mut state = match BenchmarkState::setup(&parameter, &options) {
                        Ok(state) => state,
                        Err(e) => {
                            eprintln!("Setup of {parameter} failed: {}", e.detailed());
                            continue;
                        }
                    };
                    let start = Instant::now();
                    let fetched = state.run_fetch();
                    let elapsed = start.elapsed();
                    match fetched {
                        Ok(()) => total += elapsed,
                        Err(e) => eprintln!("Discarding fetch of {parameter}: {}", e.detailed()),
                    }
                    state.teardown();
                }
                total
            });
        });
    }

    group.finish();
}

criterion_group!(fetch, bench_fetch);
criterion_main!(fetch);
