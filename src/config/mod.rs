pub mod settings;

pub use settings::{validate_production_config, AppConfig};
