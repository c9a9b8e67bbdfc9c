//! Millisecond presentation clock.
//!
//! The browser hands `requestAnimationFrame` callbacks a timestamp; winit's
//! redraw events don't carry one, so both targets read the clock here.

#[cfg(not(target_arch = "wasm32"))]
use std::{sync::OnceLock, time::Instant};

#[cfg(not(target_arch = "wasm32"))]
static START: OnceLock<Instant> = OnceLock::new();

/// Milliseconds since the first call. Never goes backwards.
#[cfg(not(target_arch = "wasm32"))]
pub fn now_ms() -> f64 {
    START.get_or_init(Instant::now).elapsed().as_secs_f64() * 1000.0
}

/// Milliseconds since the page loaded, from the high-resolution timer that
/// also stamps `requestAnimationFrame` callbacks. Reads 0 without a window.
#[cfg(target_arch = "wasm32")]
pub fn now_ms() -> f64 {
    web_sys::window()
        .and_then(|window| window.performance())
        .map_or(0.0, |performance| performance.now())
}

/// Reduce a timestamp to the window the simulation hash is seeded with.
///
/// Keeping the seed small keeps it exact when it reaches the shader.
pub fn wrap_ms(timestamp_ms: f64, wrap: u32) -> u32 {
    if wrap == 0 || !timestamp_ms.is_finite() || timestamp_ms <= 0.0 {
        return 0;
    }
    (timestamp_ms as u64 % wrap as u64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_into_window() {
        assert_eq!(wrap_ms(0.0, 30_000), 0);
        assert_eq!(wrap_ms(29_999.9, 30_000), 29_999);
        assert_eq!(wrap_ms(30_000.0, 30_000), 0);
        assert_eq!(wrap_ms(61_234.5, 30_000), 1_234);
    }

    #[test]
    fn rejects_garbage_timestamps() {
        assert_eq!(wrap_ms(f64::NAN, 30_000), 0);
        assert_eq!(wrap_ms(-5.0, 30_000), 0);
        assert_eq!(wrap_ms(5.0, 0), 0);
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn native_clock_is_monotonic() {
        let a = now_ms();
        let b = now_ms();
        assert!(b >= a);
    }
}
