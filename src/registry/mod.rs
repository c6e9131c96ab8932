// ABOUTME: Registry connection settings, their JSON file store and health probe.
// ABOUTME: Settings are read and written wholesale; there is no partial update.

mod health;
mod settings;
mod store;

pub use health::{RegistryHealth, check_health};
pub use settings::{RegistrySettings, RegistrySettingsView};
pub use store::{DEFAULT_REGISTRY_FILE, RegistryError, RegistryStore};
