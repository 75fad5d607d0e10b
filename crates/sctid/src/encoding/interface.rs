use super::SctId;
use crate::error::Result;

/// Converts between decoded identifier components and their textual form.
///
/// Implementations must be pure and deterministic: encoding the same
/// [`SctId`] always yields the same string, and `decode(encode(id)) == id`.
/// The identifier service never inspects or recomputes check digits itself;
/// it relies entirely on the encoder.
pub trait IdentifierEncoder: Send + Sync {
    /// Formats `id` as its final identifier string.
    fn encode(&self, id: &SctId) -> String;

    /// Parses and validates an identifier string.
    ///
    /// # Errors
    /// Returns [`Error::InvalidIdentifier`](crate::Error::InvalidIdentifier)
    /// for malformed input.
    fn decode(&self, id: &str) -> Result<SctId>;
}

/// The standard SNOMED CT layout with a Verhoeff check digit.
#[derive(Clone, Copy, Debug, Default)]
pub struct SnomedEncoder;

impl IdentifierEncoder for SnomedEncoder {
    fn encode(&self, id: &SctId) -> String {
        id.to_string()
    }

    fn decode(&self, id: &str) -> Result<SctId> {
        id.parse()
    }
}
