use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    /// `exiftool` or `native`.
    pub metadata_backend: String,
    pub exiftool_path: String,
    pub dng_converter_path: String,
    /// Quarantine folder created inside the scanned directory by `clean_dupes`.
    pub duplicates_dir: String,
    pub raw_extension: String,
}

impl AppConfig {
    pub fn load(extra: Option<&Path>) -> Result<Self, ConfigError> {
        let env = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let mut builder = Config::builder()
            .set_default("log_level", "info")?
            .set_default("metadata_backend", "exiftool")?
            .set_default("exiftool_path", "exiftool")?
            .set_default("dng_converter_path", default_dng_converter())?
            .set_default("duplicates_dir", "_duplicates")?
            .set_default("raw_extension", "ARW")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(File::with_name("config/local").required(false));

        if let Some(path) = extra {
            builder = builder.add_source(File::from(path));
        }

        let s = builder
            .add_source(Environment::with_prefix("PHOTO_UTILS"))
            .build()?;

        s.try_deserialize()
    }
}

fn default_dng_converter() -> &'static str {
    if cfg!(target_os = "macos") {
        "/Applications/Adobe DNG Converter.app/Contents/MacOS/Adobe DNG Converter"
    } else if cfg!(windows) {
        r"C:\Program Files\Adobe\Adobe DNG Converter\Adobe DNG Converter.exe"
    } else {
        "Adobe DNG Converter"
    }
}
