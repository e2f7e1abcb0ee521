use serde::{Deserialize, Serialize};

/// Environment variable that overrides [`AlgorithmConfig::block_size`].
pub const BLOCK_SIZE_ENV: &str = "GRIDLA_BLOCK_SIZE";

/// Which SUMMA formulation `gemm` runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GemmVariant {
    /// Stationary-C unless the inner dimension dwarfs both outer ones.
    #[default]
    Auto,
    /// Broadcast panels of `A` and `B` and accumulate into the stationary `C`.
    StationaryC,
    /// Spread the inner dimension over every process and sum-scatter the
    /// partial products into `C`.
    Dot,
}

/// Tuning knobs threaded through every blocked algorithm.
///
/// All processes of a grid must pass equal configurations: the block size
/// decides how many collectives each algorithm issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlgorithmConfig {
    /// Panel width of the blocked algorithms.
    pub block_size: usize,
    pub gemm_variant: GemmVariant,
}

impl Default for AlgorithmConfig {
    fn default() -> Self {
        Self {
            block_size: 128,
            gemm_variant: GemmVariant::Auto,
        }
    }
}

impl AlgorithmConfig {
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        assert!(block_size > 0, "block size must be positive");
        self.block_size = block_size;
        self
    }

    pub fn with_gemm_variant(mut self, variant: GemmVariant) -> Self {
        self.gemm_variant = variant;
        self
    }

    /// Defaults, overlaid with `GRIDLA_BLOCK_SIZE` when it parses as a
    /// positive integer.
    pub fn from_env() -> Self {
        let config = Self::default();
        match std::env::var(BLOCK_SIZE_ENV).ok().and_then(|v| v.parse::<usize>().ok()) {
            Some(nb) if nb > 0 => config.with_block_size(nb),
            _ => config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let cfg = AlgorithmConfig::default()
            .with_block_size(16)
            .with_gemm_variant(GemmVariant::Dot);
        assert_eq!(cfg.block_size, 16);
        assert_eq!(cfg.gemm_variant, GemmVariant::Dot);
    }

    #[test]
    fn test_serde_defaults_missing_fields() {
        let cfg: AlgorithmConfig = serde_json::from_str(r#"{"block_size": 32}"#).unwrap();
        assert_eq!(cfg.block_size, 32);
        assert_eq!(cfg.gemm_variant, GemmVariant::Auto);

        let json = serde_json::to_string(&cfg.with_gemm_variant(GemmVariant::StationaryC)).unwrap();
        assert!(json.contains("stationary_c"));
    }

    #[test]
    #[should_panic(expected = "block size")]
    fn test_zero_block_size_rejected() {
        let _ = AlgorithmConfig::default().with_block_size(0);
    }
}
