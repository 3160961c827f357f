//! Configuration validation with range checks.

use crate::error::ConfigError;
use crate::pipeline::encode::PNG_MAX_DIMENSION;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.processing.parallel_workers == 0 {
            return Err(ConfigError::ValidationError(
                "processing.parallel_workers must be > 0".into(),
            ));
        }
        if self.limits.max_file_size_mb == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_file_size_mb must be > 0".into(),
            ));
        }
        if self.limits.max_image_dimension == 0
            || self.limits.max_image_dimension > PNG_MAX_DIMENSION
        {
            return Err(ConfigError::ValidationError(format!(
                "limits.max_image_dimension must be between 1 and {PNG_MAX_DIMENSION}"
            )));
        }
        if self.limits.max_decoded_mb == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_decoded_mb must be > 0".into(),
            ));
        }
        if self.analysis.palette_cap == 0 {
            return Err(ConfigError::ValidationError(
                "analysis.palette_cap must be > 0".into(),
            ));
        }
        if self
            .analysis
            .brightness_thresholds
            .windows(2)
            .any(|pair| pair[0] >= pair[1])
        {
            return Err(ConfigError::ValidationError(
                "analysis.brightness_thresholds must be strictly ascending".into(),
            ));
        }
        if self.encoding.compression_level > 9 {
            return Err(ConfigError::ValidationError(
                "encoding.compression_level must be between 0 and 9".into(),
            ));
        }
        if self.output.manifest_file.is_empty() || self.output.error_file.is_empty() {
            return Err(ConfigError::ValidationError(
                "output.manifest_file and output.error_file must not be empty".into(),
            ));
        }
        Ok(())
    }
}
