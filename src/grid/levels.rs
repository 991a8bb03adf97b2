//! Pure grid level generation

use super::types::{GridLevel, SpacingMode};

/// Generate the ordered price levels for a grid.
///
/// Returns `count + 1` prices with `levels[0] == lower` and
/// `levels[count] == upper`. Both boundary indices are forced to the exact
/// configured bounds so float accumulation never drifts the edges.
pub fn generate(lower: f64, upper: f64, count: usize, mode: SpacingMode) -> Vec<GridLevel> {
    (0..=count)
        .map(|i| {
            let price = if i == 0 {
                lower
            } else if i == count {
                upper
            } else {
                match mode {
                    SpacingMode::Arithmetic => lower + i as f64 * (upper - lower) / count as f64,
                    SpacingMode::Geometric => {
                        let ratio = (upper / lower).powf(1.0 / count as f64);
                        lower * ratio.powi(i as i32)
                    }
                }
            };
            GridLevel::new(i, price)
        })
        .collect()
}
