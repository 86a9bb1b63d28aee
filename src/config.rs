//! Configuration management.
use crate::error::IonifyError;
use config::Config;
use serde::{Deserialize, Serialize};

/// Application settings, loaded from an optional TOML file over built-in
/// defaults. Every field has a default so a missing file is a normal run.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    pub log_level: String,
    /// `pretty`, `compact` or `json`.
    pub log_format: String,
    /// File name of the tabular report inside the scanned folder.
    pub table_file_name: String,
    /// File name of the image contact sheet inside the scanned folder.
    pub images_file_name: String,
    /// Folder scanned when the CLI gets no folder argument.
    pub default_input_dir: Option<String>,
    /// Overrides the assets directory discovery chain.
    pub assets_dir: Option<String>,
    pub check_updates: bool,
    /// Remote file holding the latest released version string.
    pub update_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "compact".to_string(),
            table_file_name: "BestModeData_V3.pdf".to_string(),
            images_file_name: "Ion_gun_maps.pdf".to_string(),
            default_input_dir: None,
            assets_dir: None,
            check_updates: true,
            update_url: "https://raw.githubusercontent.com/jozef-srogon/IonGunReport/main/app/version.py"
                .to_string(),
        }
    }
}

impl Settings {
    pub fn new(config_name: Option<&str>) -> Result<Self, IonifyError> {
        let config_path = config_name.unwrap_or("ionify");
        let s = Config::builder()
            .add_source(Config::try_from(&Settings::default())?)
            .add_source(config::File::with_name(config_path).required(false))
            .build()?;

        Ok(s.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let settings = Settings::new(Some("does_not_exist_anywhere")).unwrap();
        assert_eq!(settings.table_file_name, "BestModeData_V3.pdf");
        assert_eq!(settings.images_file_name, "Ion_gun_maps.pdf");
        assert!(settings.check_updates);
    }
}
