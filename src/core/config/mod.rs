pub mod defaults;
pub mod error;
pub mod paths;
pub mod settings;
pub mod validation;

pub use error::ConfigError;
pub use paths::AppPaths;
pub use settings::Settings;
