// Container snapshot as received on the stats stream

use serde::Deserialize;

/// Separator Docker prepends to container names (`/web`).
pub const NAME_SEPARATOR: char = '/';

/// One measurement set for one container, as decoded from a batch.
///
/// Every field is optional: an absent (or `null`) key means "no update this batch"
/// for that field, never zero. Byte counts arrive as JSON numbers and may be floats.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ContainerSnapshot {
    #[serde(default)]
    pub id: Option<String>,
    /// Raw wire name, including the leading separator.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "cpu")]
    pub cpu_percent: Option<f64>,
    #[serde(default, rename = "memory")]
    pub memory_used_bytes: Option<f64>,
    #[serde(default, rename = "memoryLimit")]
    pub memory_limit_bytes: Option<f64>,
    #[serde(default, rename = "memoryPercent")]
    pub memory_percent: Option<f64>,
    #[serde(default, rename = "netIn")]
    pub net_in_bytes: Option<f64>,
    #[serde(default, rename = "netOut")]
    pub net_out_bytes: Option<f64>,
    #[serde(default, rename = "blockIn")]
    pub block_in_bytes: Option<f64>,
    #[serde(default, rename = "blockOut")]
    pub block_out_bytes: Option<f64>,
}

impl ContainerSnapshot {
    /// Row key and display name: the wire name without its leading separator.
    ///
    /// Only one separator is stripped; names reported without one are used as-is.
    /// Returns `None` when the name is missing or nothing is left after stripping.
    pub fn identity(&self) -> Option<&str> {
        let name = self.name.as_deref()?;
        let identity = name.strip_prefix(NAME_SEPARATOR).unwrap_or(name);
        (!identity.is_empty()).then_some(identity)
    }
}
