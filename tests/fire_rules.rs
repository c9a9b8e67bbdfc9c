//! Behaviour shared by the scatter (CPU) and gather (shader) automata.
//!
//! The two draw their randomness differently, so they are compared
//! statistically: same drift distribution, same average cooling per tick.

use pixelfire::{
    config::FireConfig,
    palette::Palette,
    sim::{FireBuffer, gather},
};

const W: usize = 320;
const H: usize = 200;

#[test]
fn palette_scenarios() {
    let palette = Palette::generate(80).unwrap();
    let first = palette.get(0);
    let last = palette.get(79);
    assert_eq!((first.r, first.g, first.b), (0, 0, 0));
    assert_eq!((last.r, last.g, last.b), (255, 255, 255));
}

#[test]
fn fresh_buffers_light_only_the_fuel_line() {
    let cpu = FireBuffer::new(W, H, 80);
    assert!(cpu.row(H - 1).iter().all(|&c| c == 79));
    assert!((0..H - 1).all(|y| cpu.row(y).iter().all(|&c| c == 0)));

    let gpu = gather::seed_intensities(W, H);
    assert!(gpu[(H - 1) * W..].iter().all(|&c| c == 255));
    assert!(gpu[..(H - 1) * W].iter().all(|&c| c == 0));
}

#[test]
fn one_step_never_exceeds_the_source_row() {
    let mut cpu = FireBuffer::with_seed(W, H, 80, 1);
    cpu.step();
    assert!(cpu.row(H - 2).iter().all(|&c| c == 0 || c == 78 || c == 79));

    let prev = gather::seed_intensities(W, H);
    let mut next = vec![0; W * H];
    gather::gather_step(&prev, &mut next, W, H, 500, FireConfig::default().max_decay);
    let row = &next[(H - 2) * W..(H - 1) * W];
    let coolest = 255 - (FireConfig::default().max_decay * 255.0).ceil() as u8;
    assert!(row.iter().all(|&c| c == 0 || c >= coolest), "{row:?}");
    assert!(row.iter().any(|&c| c > 0 && c < 255));
}

/// Mean heat lost by the row above the fuel line after one tick, as a
/// fraction of full heat, counting only cells that received heat.
fn cpu_cooling_per_tick(seed: u64) -> f64 {
    let mut buffer = FireBuffer::with_seed(W, H, 80, seed);
    buffer.step();
    let lit: Vec<f64> = buffer
        .row(H - 2)
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| (79 - c) as f64 / 79.0)
        .collect();
    lit.iter().sum::<f64>() / lit.len() as f64
}

fn gather_cooling_per_tick(time_ms: u32) -> f64 {
    let prev = gather::seed_intensities(W, H);
    let mut next = vec![0; W * H];
    gather::gather_step(&prev, &mut next, W, H, time_ms, FireConfig::default().max_decay);
    let lit: Vec<f64> = next[(H - 2) * W..(H - 1) * W]
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| (255 - c) as f64 / 255.0)
        .collect();
    lit.iter().sum::<f64>() / lit.len() as f64
}

#[test]
fn cpu_and_gather_cool_at_the_same_rate() {
    let runs = 40;
    let cpu = (0..runs).map(cpu_cooling_per_tick).sum::<f64>() / runs as f64;
    let gpu = (0..runs as u32)
        .map(|i| gather_cooling_per_tick(i * 733))
        .sum::<f64>()
        / runs as f64;
    let relative = (cpu - gpu).abs() / cpu;
    assert!(relative < 0.15, "cpu {cpu:.5} vs gather {gpu:.5}");
}

#[test]
fn cpu_and_gather_light_a_similar_share_of_the_row_above() {
    // A column stays dark when nothing drifts onto it; for independent
    // uniform drifts that happens to about (2/3)^3 of interior cells.
    let expected = 1.0 - (2.0f64 / 3.0).powi(3);

    let mut buffer = FireBuffer::with_seed(W, H, 80, 5);
    buffer.step();
    let cpu = buffer.row(H - 2).iter().filter(|&&c| c > 0).count() as f64 / W as f64;

    let prev = gather::seed_intensities(W, H);
    let mut next = vec![0; W * H];
    gather::gather_step(&prev, &mut next, W, H, 1234, FireConfig::default().max_decay);
    let gpu = next[(H - 2) * W..(H - 1) * W]
        .iter()
        .filter(|&&c| c > 0)
        .count() as f64
        / W as f64;

    assert!((cpu - expected).abs() < 0.1, "cpu {cpu}");
    assert!((gpu - expected).abs() < 0.1, "gather {gpu}");
}

#[test]
fn gather_fire_rises_over_time() {
    let mut prev = gather::seed_intensities(W, H);
    let mut next = vec![0; W * H];
    for tick in 0..100u32 {
        gather::gather_step(&prev, &mut next, W, H, tick * 16, FireConfig::default().max_decay);
        std::mem::swap(&mut prev, &mut next);
    }
    let lit_rows = (0..H)
        .filter(|&y| prev[y * W..(y + 1) * W].iter().any(|&c| c > 0))
        .count();
    assert!(lit_rows > 50, "only {lit_rows} rows lit after 100 ticks");
    assert!(prev[(H - 1) * W..].iter().all(|&c| c == 255));
}
