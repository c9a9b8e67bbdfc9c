//! CPU fire automaton.
//!
//! `FireBuffer` is the scatter version driven by the two CPU variants. The
//! [`gather`] module mirrors the shader's per-destination rule on the CPU.

pub mod gather;

/// Grid of palette indices, row-major, row 0 at the top.
///
/// The bottom row is the fuel line: it is seeded with the hottest index and
/// never written by [`FireBuffer::step`].
#[derive(Clone)]
pub struct FireBuffer {
    width: usize,
    height: usize,
    palette_size: usize,
    cells: Vec<u8>,
    rng: fastrand::Rng,
}

impl FireBuffer {
    /// A cold buffer with a lit bottom row. `palette_size` must be in 2..=256
    /// and `height` at least 1.
    pub fn new(width: usize, height: usize, palette_size: usize) -> FireBuffer {
        Self::with_rng(width, height, palette_size, fastrand::Rng::new())
    }

    /// Same as [`FireBuffer::new`] with a reproducible random sequence.
    pub fn with_seed(width: usize, height: usize, palette_size: usize, seed: u64) -> FireBuffer {
        Self::with_rng(width, height, palette_size, fastrand::Rng::with_seed(seed))
    }

    fn with_rng(width: usize, height: usize, palette_size: usize, rng: fastrand::Rng) -> Self {
        debug_assert!((2..=256).contains(&palette_size));
        let mut buffer = FireBuffer {
            width,
            height,
            palette_size,
            cells: vec![0; width * height],
            rng,
        };
        buffer.reset();
        buffer
    }

    /// Back to the initial state: everything cold except the fuel line.
    pub fn reset(&mut self) {
        self.cells.fill(0);
        let hottest = self.hottest();
        let bottom = (self.height - 1) * self.width;
        self.cells[bottom..].fill(hottest);
    }

    /// Advance one tick.
    ///
    /// Every cell above the fuel line pushes its heat one row up, drifting by
    /// -1, 0 or +1 columns and losing one step half of the time. Heat that
    /// drifts off the side is dropped. Destinations nobody lands on keep
    /// their value; when two sources land on the same cell the later one
    /// wins.
    pub fn step(&mut self) {
        let w = self.width;
        for y in 1..self.height {
            let dest_y = y - 1;
            for x in 0..w {
                let dest_x = x as isize + self.rng.isize(-1..=1);
                if dest_x < 0 || dest_x >= w as isize {
                    continue;
                }
                let mut color = self.cells[y * w + x];
                if color > 0 && self.rng.bool() {
                    color -= 1;
                }
                self.cells[dest_y * w + dest_x as usize] = color;
            }
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// The index of the hottest palette entry.
    pub fn hottest(&self) -> u8 {
        (self.palette_size - 1) as u8
    }

    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    pub fn row(&self, y: usize) -> &[u8] {
        &self.cells[y * self.width..(y + 1) * self.width]
    }

    /// Indices rescaled to the red channel of a simulation texture, so a CPU
    /// frame can be drawn by the shader render program.
    pub fn to_intensity_rgba(&self) -> Vec<u8> {
        let top = self.hottest() as u32;
        self.cells
            .iter()
            .flat_map(|&i| {
                let r = ((i as u32 * 255 + top / 2) / top) as u8;
                [r, 0, 0, 255]
            })
            .collect()
    }
}
