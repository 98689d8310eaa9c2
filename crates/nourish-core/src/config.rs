//! Engine configuration

/// Delivery engine configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryConfig {
    /// Page size for history listings when the caller gives none
    pub default_list_limit: u32,
    /// Upper bound applied to caller-supplied page sizes
    pub max_list_limit: u32,
}

impl DeliveryConfig {
    /// Create a config with default limits
    pub fn new() -> Self {
        Self {
            default_list_limit: 10,
            max_list_limit: 100,
        }
    }

    /// Set listing limits; `max` is raised to at least `default`
    pub fn with_list_limits(mut self, default: u32, max: u32) -> Self {
        self.default_list_limit = default.max(1);
        self.max_list_limit = max.max(self.default_list_limit);
        self
    }

    /// Resolve a caller-supplied limit into `1..=max_list_limit`
    pub fn effective_limit(&self, requested: Option<u32>) -> u32 {
        requested
            .unwrap_or(self.default_list_limit)
            .clamp(1, self.max_list_limit)
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self::new()
    }
}
