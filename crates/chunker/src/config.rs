use serde::{Deserialize, Serialize};

pub const DEFAULT_CHUNK_SIZE: usize = 500;
pub const DEFAULT_CHUNK_OVERLAP: usize = 50;

/// Configuration for passage chunking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkerConfig {
    /// Maximum characters per chunk window
    pub chunk_size: usize,

    /// Characters shared between consecutive windows
    pub overlap: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

impl ChunkerConfig {
    #[must_use]
    pub const fn new(chunk_size: usize, overlap: usize) -> Self {
        Self {
            chunk_size,
            overlap,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.chunk_size == 0 {
            return Err("chunk_size must be > 0".to_string());
        }

        if self.overlap >= self.chunk_size {
            return Err(format!(
                "overlap ({}) must be smaller than chunk_size ({})",
                self.overlap, self.chunk_size
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = ChunkerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.chunk_size, 500);
        assert_eq!(config.overlap, 50);
    }

    #[test]
    fn test_config_validation() {
        assert!(ChunkerConfig::new(0, 0).validate().is_err());
        assert!(ChunkerConfig::new(10, 10).validate().is_err());
        assert!(ChunkerConfig::new(10, 20).validate().is_err());

        assert!(ChunkerConfig::new(1, 0).validate().is_ok());
        assert!(ChunkerConfig::new(10, 9).validate().is_ok());
    }
}
