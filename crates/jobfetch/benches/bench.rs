use core::hint::black_box;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use jobfetch::{
    Dispatcher, JobFetcher, LoadFactor, RequestFailure, WorkerCap, WorkerPlan, partition,
};
use tokio::runtime::Builder;

// Number of job indices per benchmark iteration.
const TOTAL_JOBS: usize = 4096;

/// In-memory fetcher so the benchmark measures dispatch overhead only.
struct InMemory;

impl JobFetcher for InMemory {
    async fn fetch(&self, index: usize) -> Result<Option<String>, RequestFailure> {
        Ok(Some(index.to_string()))
    }
}

fn bench_partition(c: &mut Criterion) {
    let mut group = c.benchmark_group("partition");
    group.throughput(Throughput::Elements(TOTAL_JOBS as u64));

    for parts in [1, 8, 500, TOTAL_JOBS] {
        group.bench_function(format!("parts/{parts}"), |b| {
            b.iter(|| black_box(partition(black_box(TOTAL_JOBS), parts)));
        });
    }

    group.finish();
}

fn bench_dispatch(c: &mut Criterion) {
    let rt = Builder::new_multi_thread().enable_all().build().unwrap();
    let mut group = c.benchmark_group("dispatch");
    group.throughput(Throughput::Elements(TOTAL_JOBS as u64));

    for max_threads in [1, 8, 64, 500] {
        let plan = WorkerPlan::new(LoadFactor::default(), WorkerCap::from_max_threads(max_threads));
        group.bench_function(format!("workers/{max_threads}"), |b| {
            b.to_async(&rt).iter(|| async move {
                let results = Dispatcher::new(InMemory, TOTAL_JOBS, plan)
                    .run()
                    .await
                    .unwrap();
                black_box(results.len());
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_partition, bench_dispatch);
criterion_main!(benches);
