//! Per-cube color assignment.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::settings::{Color, ColorScheme};

/// Fixed hue palette used by [`ColorScheme::Rainbow`].
pub const RAINBOW_PALETTE: [Color; 7] = [
    Color::from_hex(0x00ff_0000), // red
    Color::from_hex(0x00ff_7f00), // orange
    Color::from_hex(0x00ff_ff00), // yellow
    Color::from_hex(0x0000_ff00), // green
    Color::from_hex(0x0000_7fff), // azure
    Color::from_hex(0x0000_00ff), // blue
    Color::from_hex(0x008b_00ff), // violet
];

/// Chooses cube colors for a scheme.
///
/// Pure in `(scheme, index, single)` for `Rainbow` and `Single`; `Random`
/// draws from an owned generator and yields a new color on every call.
pub struct ColorAssigner {
    rng: SmallRng,
}

impl Default for ColorAssigner {
    fn default() -> Self {
        Self::new()
    }
}

impl ColorAssigner {
    /// Assigner seeded from the OS entropy source.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: SmallRng::from_os_rng(),
        }
    }

    /// Assigner with a fixed seed, for reproducible random schemes.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Color for cube `index`.
    pub fn color_for(
        &mut self,
        scheme: ColorScheme,
        index: usize,
        single: Color,
    ) -> Color {
        match scheme {
            ColorScheme::Random => {
                Color::from_hex(self.rng.random_range(0..=0x00ff_ffff))
            }
            ColorScheme::Rainbow => rainbow(index),
            ColorScheme::Single => single,
        }
    }
}

/// Rainbow palette entry for cube `index`, cycling every seven cubes.
#[must_use]
pub fn rainbow(index: usize) -> Color {
    RAINBOW_PALETTE[index % RAINBOW_PALETTE.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rainbow_cycles_every_seven() {
        let mut assigner = ColorAssigner::with_seed(1);
        let single = Color::from_hex(0);
        for i in 0..60 {
            for k in 1..4 {
                assert_eq!(
                    assigner.color_for(ColorScheme::Rainbow, i, single),
                    assigner.color_for(ColorScheme::Rainbow, i + 7 * k, single),
                );
            }
        }
        assert_eq!(rainbow(0), RAINBOW_PALETTE[0]);
        assert_ne!(rainbow(0), rainbow(1));
    }

    #[test]
    fn single_ignores_index() {
        let mut assigner = ColorAssigner::with_seed(1);
        let green = Color::from_hex(0x00ff00);
        for i in 0..10 {
            assert_eq!(assigner.color_for(ColorScheme::Single, i, green), green);
        }
    }

    #[test]
    fn random_redraws_on_every_call() {
        let mut assigner = ColorAssigner::with_seed(42);
        let single = Color::from_hex(0);
        let first: Vec<Color> = (0..16)
            .map(|i| assigner.color_for(ColorScheme::Random, i, single))
            .collect();
        let second: Vec<Color> = (0..16)
            .map(|i| assigner.color_for(ColorScheme::Random, i, single))
            .collect();
        assert_ne!(first, second);
        assert!(first.iter().all(|c| c.hex() <= 0xff_ffff));
    }

    #[test]
    fn seeded_assigners_agree() {
        let mut a = ColorAssigner::with_seed(7);
        let mut b = ColorAssigner::with_seed(7);
        let single = Color::from_hex(0);
        for i in 0..8 {
            assert_eq!(
                a.color_for(ColorScheme::Random, i, single),
                b.color_for(ColorScheme::Random, i, single),
            );
        }
    }
}
