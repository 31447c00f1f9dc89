pub mod settings;

pub use settings::{ClientFlags, DocumentSettings, SETTINGS_SECTION};
