//! Heap configuration parameters.
//!
//! Sizes are tunable per workload; defaults suit the runtime's unit of
//! deployment (one heap per interpreter instance).

/// Configuration for the Opal heap.
///
/// # Example
///
/// ```ignore
/// use opal_gc::GcConfig;
///
/// let config = GcConfig {
///     nursery_size: 1024 * 1024, // 1MB nursery
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct GcConfig {
    /// Size of the nursery (young generation) in bytes.
    ///
    /// Young objects are bump-allocated here; the write barrier classifies
    /// pointers into this range as young. Once the nursery fills,
    /// allocations spill into the old space.
    ///
    /// Default: 4MB
    pub nursery_size: usize,

    /// Size of each old-generation block in bytes.
    ///
    /// The old space grows one block at a time as objects are tenured.
    ///
    /// Default: 64KB
    pub old_block_size: usize,

    /// Trace heap lifecycle to stderr: creation parameters and a
    /// statistics summary on drop.
    ///
    /// Default: false
    pub trace: bool,
}

impl Default for GcConfig {
    fn default() -> Self {
        Self {
            nursery_size: 4 * 1024 * 1024,
            old_block_size: 64 * 1024,
            trace: false,
        }
    }
}

impl GcConfig {
    /// Configuration for memory-constrained embedding.
    pub fn low_memory() -> Self {
        Self {
            nursery_size: 256 * 1024,
            old_block_size: 16 * 1024,
            ..Default::default()
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.nursery_size < 64 * 1024 {
            return Err(ConfigError::NurseryTooSmall);
        }
        if self.old_block_size < 4096 || !self.old_block_size.is_power_of_two() {
            return Err(ConfigError::InvalidBlockSize);
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Nursery size is too small (minimum 64KB).
    NurseryTooSmall,
    /// Old block size must be a power of two, minimum 4KB.
    InvalidBlockSize,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NurseryTooSmall => write!(f, "nursery size must be at least 64KB"),
            ConfigError::InvalidBlockSize => {
                write!(f, "old block size must be a power of two, minimum 4KB")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(GcConfig::default().validate().is_ok());
    }

    #[test]
    fn test_low_memory_config_is_valid() {
        assert!(GcConfig::low_memory().validate().is_ok());
    }

    #[test]
    fn test_invalid_nursery_size() {
        let config = GcConfig {
            nursery_size: 1024,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::NurseryTooSmall));
    }

    #[test]
    fn test_invalid_block_size() {
        let config = GcConfig {
            old_block_size: 5000, // not a power of two
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidBlockSize));
    }
}
