pub mod path_processing;
pub mod settings;

pub use path_processing::expand_tilde;
pub use settings::{SETTINGS_PATH_ENV, SettingsError, SettingsStore};
