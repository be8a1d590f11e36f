use finview_core::{ChartConfig, RawTable, SeriesStore};
use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, black_box};

fn gen_ohlc(n: usize) -> RawTable {
    let mut t = Vec::with_capacity(n);
    let (mut o, mut c, mut h, mut l) = (Vec::with_capacity(n), Vec::with_capacity(n), Vec::with_capacity(n), Vec::with_capacity(n));
    let mut price = 100.0f64;
    for i in 0..n {
        t.push(1_600_000_000_000.0 + i as f64 * 60_000.0);
        let open = price;
        // slow wave with drift
        let close = open + (i as f64 * 0.01).sin() * 0.5 + 0.001;
        o.push(open);
        c.push(close);
        h.push(open.max(close) + 1.0);
        l.push(open.min(close) - 1.0);
        price = close;
    }
    RawTable::new()
        .with_numeric("time", t)
        .with_numeric("open", o)
        .with_numeric("close", c)
        .with_numeric("high", h)
        .with_numeric("low", l)
}

fn store(n: usize) -> SeriesStore {
    let mut s = SeriesStore::normalize(gen_ohlc(n), &ChartConfig::default()).unwrap();
    s.set_scale_cols(vec![3, 4]).unwrap();
    s
}

fn bench_hilo_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("hilo_scan");
    for &n in &[50_000usize, 100_000usize] {
        for &w in &[200usize, 2_000usize, 20_000usize] {
            group.bench_with_input(BenchmarkId::from_parameter(format!("n{n}_w{w}")), &w, |b, &w| {
                // fresh store per batch, so every query misses
                b.iter_batched(
                    || store(n),
                    |mut s| {
                        let x0 = (n - w) as f64 - 0.5;
                        black_box(s.hilo(x0, x0 + w as f64));
                    },
                    BatchSize::LargeInput,
                );
            });
        }
    }
    group.finish();
}

fn bench_hilo_pan(c: &mut Criterion) {
    let mut group = c.benchmark_group("hilo_pan");
    let n = 100_000usize;
    for &w in &[200usize, 2_000usize] {
        let mut s = store(n);
        group.bench_with_input(BenchmarkId::from_parameter(format!("n{n}_w{w}")), &w, |b, &w| {
            // 150 distinct windows cycle through a 100-entry cache
            let mut step = 0usize;
            b.iter(|| {
                let x0 = (step % 150) as f64 - 0.5;
                step += 1;
                black_box(s.hilo(x0, x0 + w as f64))
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_hilo_scan, bench_hilo_pan);
criterion_main!(benches);
