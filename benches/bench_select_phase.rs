// benches/bench_select_phase.rs
use criterion::{
    black_box, criterion_group, criterion_main, AxisScale, Criterion, PlotConfiguration,
};
use density_traffic_manager::control_system::{decide, select_phase};
use rand::Rng;
use std::time::Duration;

// Random per-link vehicle counts, as a scan of one traffic light would produce.
fn random_densities(links: usize) -> Vec<(usize, u32)> {
    let mut rng = rand::rng();
    (0..links).map(|i| (i, rng.random_range(0..8))).collect()
}

fn bench_select_phase(c: &mut Criterion) {
    let mut group = c.benchmark_group("select_phase");

    group.sample_size(100);
    group.measurement_time(Duration::from_secs(5));
    group.warm_up_time(Duration::from_secs(2));
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Linear));

    for &links in [4, 16, 64].iter() {
        let densities = random_densities(links);
        group.bench_function(format!("links_{}", links), |b| {
            b.iter(|| black_box(select_phase(black_box(&densities))));
        });
        group.bench_function(format!("decide_links_{}", links), |b| {
            b.iter(|| black_box(decide(black_box(&densities), links / 2)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_select_phase);
criterion_main!(benches);
