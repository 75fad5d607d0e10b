/// Default bound on generation attempts per identifier.
pub const DEFAULT_MAX_GENERATION_ATTEMPTS: usize = 1000;

/// Tunables for [`IdentifierService`](super::IdentifierService).
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct IdentifierConfig {
    /// How many candidates `generate` examines before giving up. Collisions
    /// with stored or reserved identifiers and exhausted counters each use up
    /// one attempt. Values below one are treated as one.
    pub max_generation_attempts: usize,
}

impl IdentifierConfig {
    #[must_use]
    pub fn with_max_generation_attempts(mut self, attempts: usize) -> Self {
        self.max_generation_attempts = attempts;
        self
    }
}

impl Default for IdentifierConfig {
    fn default() -> Self {
        Self {
            max_generation_attempts: DEFAULT_MAX_GENERATION_ATTEMPTS,
        }
    }
}
