use track_core::{TrackError, TrackResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Aperture of the Sobel operator the default Harris setup uses
pub const DEFAULT_APERTURE: usize = 3;
/// Threshold on the 0..255 normalized Harris response
pub const DEFAULT_MIN_RESPONSE: f32 = 100.0;

/// Parameters of one suppression pass
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SuppressionConfig {
    /// Cells at or below this response are ignored; must be finite and non-negative
    pub min_response: f32,
    /// Largest tolerated intersection-over-union between two keypoints
    pub max_overlap: f32,
    /// Support diameter given to every emitted keypoint
    pub size: f32,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub name: Option<String>,
}

impl Default for SuppressionConfig {
    fn default() -> Self {
        Self::harris_preset()
    }
}

impl SuppressionConfig {
    pub fn new(min_response: f32, max_overlap: f32, size: f32) -> Self {
        Self {
            min_response,
            max_overlap,
            size,
            name: None,
        }
    }

    /// Keypoint size is twice the detector aperture
    pub fn from_aperture(aperture: usize, min_response: f32) -> Self {
        Self::new(min_response, 0.0, (2 * aperture) as f32)
    }

    /// Normalized Harris response, aperture 3, strict non-overlap
    pub fn harris_preset() -> Self {
        Self {
            name: Some("Harris".to_string()),
            ..Self::from_aperture(DEFAULT_APERTURE, DEFAULT_MIN_RESPONSE)
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn summary(&self) -> String {
        format!(
            "SuppressionConfig{}: min_response={}, max_overlap={}, size={}",
            self.name.as_deref().map(|n| format!(" '{}'", n)).unwrap_or_default(),
            self.min_response,
            self.max_overlap,
            self.size
        )
    }

    pub fn validate(&self) -> TrackResult<()> {
        if !(self.min_response.is_finite() && self.min_response >= 0.0) {
            return Err(TrackError::invalid_option("min_response", self.min_response));
        }
        if !(0.0..=1.0).contains(&self.max_overlap) {
            return Err(TrackError::invalid_option("max_overlap", self.max_overlap));
        }
        if !(self.size.is_finite() && self.size > 0.0) {
            return Err(TrackError::invalid_option("size", self.size));
        }
        Ok(())
    }

    /// Save configuration to JSON file
    #[cfg(feature = "serde")]
    pub fn save_json<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Load configuration from JSON file
    #[cfg(feature = "serde")]
    pub fn load_json<P: AsRef<std::path::Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Save configuration to TOML file
    #[cfg(feature = "serde")]
    pub fn save_toml<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Load configuration from TOML file
    #[cfg(feature = "serde")]
    pub fn load_toml<P: AsRef<std::path::Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    #[cfg(feature = "serde")]
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    #[cfg(feature = "serde")]
    pub fn from_toml(toml_str: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }
}
