use crate::error::ConfigError;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean, public-facing API.
pub use settings::{Config, DatabaseSettings, ServerSettings};

/// Loads the application configuration from the `config.toml` file.
///
/// This function is the primary entry point for this crate. It reads the
/// (optional) configuration file, layers `REPOSCOPE__*` environment variables
/// on top, deserializes the result into our strongly-typed `Config` struct,
/// and validates it. `DATABASE_URL` deliberately stays out of this file; it
/// is a secret and lives in the environment.
pub fn load_config() -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        // Tells the builder to look for a file named `config.toml`.
        // Not required: every setting has a default.
        .add_source(config::File::with_name("config.toml").required(false))
        // Environment overrides, e.g. REPOSCOPE__SERVER__PORT=9090.
        .add_source(config::Environment::with_prefix("REPOSCOPE").separator("__"))
        .build()?;

    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.try_deserialize::<Config>()?;
    config.validate()?;

    Ok(config)
}
