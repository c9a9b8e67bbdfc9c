//! The shader's gather rule, on the CPU.
//!
//! A fragment program can only write the pixel it was invoked for, so the
//! scatter step of [`super::FireBuffer`] is turned around: every destination
//! re-derives the drift its three candidate sources in the row below would
//! have drawn and takes the first one that lands on it. The hash below is
//! the same one `simulate.wgsl` uses, bit for bit, so this module doubles as
//! the reference the GPU output is checked against.

use rayon::prelude::*;

/// Hash salt for drift draws, keyed on the source cell.
pub const DRIFT_SALT: u32 = 0;
/// Hash salt for cooling draws, keyed on the destination cell.
pub const DECAY_SALT: u32 = 1;

/// PCG output permutation of a single word.
#[inline(always)]
pub fn pcg(v: u32) -> u32 {
    let state = v.wrapping_mul(747_796_405).wrapping_add(2_891_336_453);
    let word = ((state >> ((state >> 28) + 4)) ^ state).wrapping_mul(277_803_737);
    (word >> 22) ^ word
}

/// Stateless random word for a cell at a point in time.
#[inline(always)]
pub fn hash(x: u32, y: u32, time_ms: u32, salt: u32) -> u32 {
    pcg(x ^ pcg(y ^ pcg(time_ms ^ pcg(salt))))
}

/// Horizontal drift (-1, 0 or +1) the source cell at `(x, y)` draws.
#[inline(always)]
pub fn drift(x: u32, y: u32, time_ms: u32) -> i32 {
    (hash(x, y, time_ms, DRIFT_SALT) % 3) as i32 - 1
}

/// Uniform value in [0, 1) with 24 bits of precision.
#[inline(always)]
pub fn unit(x: u32, y: u32, time_ms: u32, salt: u32) -> f32 {
    (hash(x, y, time_ms, salt) >> 8) as f32 / 16_777_216.0
}

/// Red-channel intensities of a fresh simulation texture: cold everywhere
/// but the bottom row.
pub fn seed_intensities(width: usize, height: usize) -> Vec<u8> {
    let mut cells = vec![0; width * height];
    cells[(height - 1) * width..].fill(u8::MAX);
    cells
}

/// The column of the source that lands on destination `(x, y)`, if any.
///
/// Candidates are tried left, centre, right; the first hit wins. Columns
/// outside the grid are never candidates.
pub fn matching_source(x: usize, y: usize, width: usize, time_ms: u32) -> Option<usize> {
    let below = (y + 1) as u32;
    (-1i32..=1).find_map(|k| {
        let sx = x as i32 + k;
        if sx < 0 || sx >= width as i32 {
            return None;
        }
        (drift(sx as u32, below, time_ms) == -k).then_some(sx as usize)
    })
}

/// Compute `next` from `prev`, both row-major red-channel bytes of a
/// `width` x `height` texture.
pub fn gather_step(
    prev: &[u8],
    next: &mut [u8],
    width: usize,
    height: usize,
    time_ms: u32,
    max_decay: f32,
) {
    assert_eq!(prev.len(), width * height);
    assert_eq!(next.len(), width * height);

    next.par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            let own = &prev[y * width..(y + 1) * width];
            if y + 1 >= height {
                row.copy_from_slice(own);
                return;
            }
            let below = &prev[(y + 1) * width..(y + 2) * width];
            for (x, out) in row.iter_mut().enumerate() {
                *out = match matching_source(x, y, width, time_ms) {
                    Some(sx) => {
                        let decay = max_decay * unit(x as u32, y as u32, time_ms, DECAY_SALT);
                        let v = below[sx] as f32 / 255.0 - decay;
                        (v.clamp(0.0, 1.0) * 255.0).round() as u8
                    }
                    None => own[x],
                };
            }
        });
}
