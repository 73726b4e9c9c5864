//! Plank/DOT unit conversion.
//!
//! Balances live on chain in planks, the smallest indivisible unit.
//! Reports display them in DOT. The scale factor is an explicit
//! configuration value rather than a hidden constant so it can vary per
//! network without recompilation.

use tracing::warn;

/// Planks per DOT on the Polkadot relay chain.
pub const DEFAULT_PLANK_PER_DOT: u128 = 10_000_000_000;

/// The plank-per-DOT scale factor for one ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitScale {
    plank_per_dot: u128,
}

impl UnitScale {
    /// Creates a scale with the given planks-per-DOT factor.
    ///
    /// A factor of zero is nonsensical and is clamped to 1
    /// (display planks verbatim).
    pub fn new(plank_per_dot: u128) -> Self {
        Self {
            plank_per_dot: plank_per_dot.max(1),
        }
    }

    /// The relay-chain default scale.
    pub fn polkadot() -> Self {
        Self::new(DEFAULT_PLANK_PER_DOT)
    }

    /// Reads the scale from the `PLANK_PER_DOT` environment variable,
    /// falling back to the relay-chain default.
    pub fn from_env() -> Self {
        match std::env::var("PLANK_PER_DOT") {
            Ok(raw) => match raw.parse::<u128>() {
                Ok(factor) => Self::new(factor),
                Err(e) => {
                    warn!("Ignoring unparseable PLANK_PER_DOT ({}): {}", raw, e);
                    Self::polkadot()
                }
            },
            Err(_) => Self::polkadot(),
        }
    }

    pub fn plank_per_dot(&self) -> u128 {
        self.plank_per_dot
    }

    /// Formats a plank amount as a decimal DOT string.
    pub fn to_dot_string(&self, plank: u128) -> String {
        let whole = plank / self.plank_per_dot;
        let frac = plank % self.plank_per_dot;
        match fraction_width(self.plank_per_dot) {
            0 => format!("{}", whole),
            width => format!("{}.{:0width$}", whole, frac, width = width),
        }
    }
}

impl Default for UnitScale {
    fn default() -> Self {
        Self::polkadot()
    }
}

/// Number of fractional digits needed to display any remainder below
/// `plank_per_dot`.
fn fraction_width(plank_per_dot: u128) -> usize {
    match (plank_per_dot - 1).checked_ilog10() {
        Some(digits) => digits as usize + 1,
        None => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scale_is_polkadot() {
        assert_eq!(UnitScale::default().plank_per_dot(), DEFAULT_PLANK_PER_DOT);
    }

    #[test]
    fn test_to_dot_string_hundredths() {
        let scale = UnitScale::new(100);
        assert_eq!(scale.to_dot_string(1000), "10.00");
        assert_eq!(scale.to_dot_string(1500), "15.00");
        assert_eq!(scale.to_dot_string(200), "2.00");
        assert_eq!(scale.to_dot_string(1301), "13.01");
        assert_eq!(scale.to_dot_string(7), "0.07");
    }

    #[test]
    fn test_to_dot_string_relay_scale() {
        let scale = UnitScale::polkadot();
        assert_eq!(scale.to_dot_string(10_000_000_000), "1.0000000000");
        assert_eq!(scale.to_dot_string(1), "0.0000000001");
        assert_eq!(scale.to_dot_string(0), "0.0000000000");
    }

    #[test]
    fn test_scale_of_one_displays_planks() {
        let scale = UnitScale::new(1);
        assert_eq!(scale.to_dot_string(42), "42");
    }

    #[test]
    fn test_zero_scale_is_clamped() {
        let scale = UnitScale::new(0);
        assert_eq!(scale.plank_per_dot(), 1);
    }
}
