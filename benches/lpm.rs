use std::error::Error;

use criterion::{
    criterion_group, criterion_main, BenchmarkId, Criterion, Throughput,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use name_fib::fib::config::{BackendKind, FibConfig};
use name_fib::fib::{Fib, FibBackend};
use name_fib::{Bitmap, Name};

const PORTS: usize = 32;
const ROUTES_NUM: usize = 10_000;
const SEARCHES_NUM: usize = 1_000;

fn random_names(
    rng: &mut StdRng,
    count: usize,
    max_len: usize,
) -> Result<Vec<Name>, Box<dyn Error>> {
    let mut names = Vec::with_capacity(count);
    for _ in 0..count {
        let len = rng.random_range(1..=max_len);
        let segments = (0..len)
            .map(|_| format!("s{}", rng.random_range(0..64_u32)))
            .collect::<Vec<_>>();
        names.push(Name::from_segments(&segments)?);
    }
    Ok(names)
}

fn create_fib(
    kind: BackendKind,
    names: &[Name],
    rng: &mut StdRng,
) -> Result<FibBackend, Box<dyn Error>> {
    let mut config = FibConfig::default_for(kind);
    config.set_seed(1);
    let mut fib = config.build()?;
    for name in names {
        let egress = Bitmap::from_indices(PORTS, [rng.random_range(0..PORTS)]);
        fib.insert(name, &egress);
    }
    Ok(fib)
}

fn bench_lpm(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(42);
    let (Ok(routes), Ok(searches)) = (
        random_names(&mut rng, ROUTES_NUM, 6),
        random_names(&mut rng, SEARCHES_NUM, 10),
    ) else {
        return;
    };

    let mut group = c.benchmark_group("lpm");
    group.throughput(Throughput::Elements(SEARCHES_NUM as u64));

    for kind in BackendKind::ALL {
        let Ok(fib) = create_fib(kind, &routes, &mut rng) else {
            continue;
        };
        group.bench_with_input(
            BenchmarkId::from_parameter(kind),
            &fib,
            |b, fib| {
                b.iter(|| {
                    searches.iter().filter(|name| fib.lpm(name).is_some()).count()
                })
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_lpm);
criterion_main!(benches);
