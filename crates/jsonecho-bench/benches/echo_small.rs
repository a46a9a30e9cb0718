//! Echo handlers on the small fixed payload.
//!
//! ```bash
//! cargo bench -p jsonecho-bench --bench echo_small
//! ```

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use jsonecho_bench::{check_echo, report_allocations, request, small_payload, CountingAllocator};
use jsonecho_core::{EchoConfig, Variant};

#[global_allocator]
static ALLOCATOR: CountingAllocator = CountingAllocator::new();

fn bench_echo_small(c: &mut Criterion) {
    let payload = small_payload();

    for variant in Variant::ALL {
        check_echo(variant, &payload).unwrap_or_else(|e| panic!("{}", e));
    }
    report_allocations(&ALLOCATOR, "echo_small", &payload);

    let mut group = c.benchmark_group("echo_small");
    group.throughput(Throughput::Bytes(payload.len() as u64));

    for variant in Variant::ALL {
        let config = EchoConfig::default();
        group.bench_function(variant.name(), |b| {
            b.iter(|| black_box(variant.handle(request(black_box(&payload)), config)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_echo_small);
criterion_main!(benches);
