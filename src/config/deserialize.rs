// ABOUTME: Custom serde deserializers for config types.
// ABOUTME: Handles the runtime override, where "auto" means probe.

use serde::Deserialize;

use crate::runtime::RuntimeType;

/// Accepts `docker`, `nerdctl`, `crictl` (any case) or `auto`/empty for detection.
pub fn deserialize_runtime<'de, D>(deserializer: D) -> Result<Option<RuntimeType>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) if s.eq_ignore_ascii_case("auto") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}
