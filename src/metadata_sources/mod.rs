pub mod exiftool;
pub mod native;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::metadata_source::MetadataSource;
use config::ConfigError;

pub fn from_config(config: &AppConfig) -> Result<Box<dyn MetadataSource>, AppError> {
    match config.metadata_backend.as_str() {
        "exiftool" => Ok(Box::new(exiftool::ExifToolSource::new(
            &config.exiftool_path,
        )?)),
        "native" => Ok(Box::new(native::NativeSource::new())),
        other => Err(AppError::Config(ConfigError::Message(format!(
            "unknown metadata_backend {:?}, expected \"exiftool\" or \"native\"",
            other
        )))),
    }
}
