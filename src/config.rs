//! Explicit configuration for the executor and envelope codec.
//!
//! Passed into constructors rather than read from process-wide mutable
//! defaults, per the "global configuration" design note: padding cadence,
//! flatten threshold, and PBKDF2 iteration count all live here.

/// Tunables for a single archive session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Average number of non-`pad` commands between inserted `pad` lines.
    /// `0` disables padding entirely.
    pub padding_cadence: u32,
    /// History length (line count) at which the flattener is invoked.
    pub flatten_threshold: usize,
    /// PBKDF2 iteration count used when encrypting with this config.
    /// Must be at least 250,000 per the envelope contract.
    pub pbkdf2_iterations: u32,
}

impl Config {
    /// Minimum iteration count the envelope codec will accept when
    /// encrypting a new archive.
    pub const MIN_PBKDF2_ITERATIONS: u32 = 250_000;

    /// Construct a config, clamping the iteration count up to the
    /// contractual minimum if given a lower value.
    pub fn new(padding_cadence: u32, flatten_threshold: usize, pbkdf2_iterations: u32) -> Config {
        return Config {
            padding_cadence,
            flatten_threshold,
            pbkdf2_iterations: pbkdf2_iterations.max(Self::MIN_PBKDF2_ITERATIONS),
        };
    }
}

impl Default for Config {
    /// Sane production defaults: pad roughly every 20 commands, flatten
    /// past 500 lines, and use the contractual minimum PBKDF2 work factor.
    fn default() -> Config {
        return Config {
            padding_cadence: 20,
            flatten_threshold: 500,
            pbkdf2_iterations: Config::MIN_PBKDF2_ITERATIONS,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_meets_minimum_iterations() {
        let config = Config::default();
        assert!(config.pbkdf2_iterations >= Config::MIN_PBKDF2_ITERATIONS);
    }

    #[test]
    fn new_clamps_low_iterations_up() {
        let config = Config::new(10, 100, 1_000);
        assert_eq!(config.pbkdf2_iterations, Config::MIN_PBKDF2_ITERATIONS);
    }

    #[test]
    fn new_preserves_high_iterations() {
        let config = Config::new(10, 100, 500_000);
        assert_eq!(config.pbkdf2_iterations, 500_000);
    }
}
