pub mod data;
pub mod store;
#[cfg(test)]
mod tests;

pub use data::{mask_secret, Config, SettingKey, SettingsError, DEFAULT_THEME};
pub use store::ConfigStore;
