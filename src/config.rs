// src/config.rs
// Configuration system for lango

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    #[serde(default)]
    pub public: Option<String>,

    #[serde(default = "default_directory_listing")]
    pub directory_listing: bool,

    #[serde(default = "default_etag")]
    pub etag: bool,
}

fn default_directory_listing() -> bool {
    true
}
fn default_etag() -> bool {
    true
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            public: None,
            directory_listing: default_directory_listing(),
            etag: default_etag(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    FileNotFound(String),
    ParseError(String),
    ValidationError(String),
    IoError(std::io::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => write!(f, "Configuration file not found: {}", path),
            ConfigError::ParseError(msg) => write!(f, "Failed to parse configuration: {}", msg),
            ConfigError::ValidationError(msg) => {
                write!(f, "Configuration validation failed: {}", msg)
            }
            ConfigError::IoError(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IoError(err)
    }
}

pub struct ConfigLoader {
    current_dir: PathBuf,
    serve_dir: PathBuf,
}

impl ConfigLoader {
    pub fn new(current_dir: PathBuf, serve_dir: PathBuf) -> Self {
        Self {
            current_dir,
            serve_dir,
        }
    }

    pub fn load_configuration(
        &self,
        custom_config_path: Option<&str>,
    ) -> Result<Configuration, ConfigError> {
        let mut config = Configuration::default();

        // Configuration files to check, in order of priority
        let config_files = if let Some(custom_path) = custom_config_path {
            vec![custom_path.to_string()]
        } else {
            vec![
                "serve.json".to_string(),
                "now.json".to_string(),
                "package.json".to_string(),
            ]
        };

        for file_name in config_files {
            // A custom config path is used directly (it may be absolute);
            // the well-known names live in the serve directory
            let config_path = if custom_config_path.is_some() {
                PathBuf::from(&file_name)
            } else {
                self.serve_dir.join(&file_name)
            };

            if !config_path.exists() {
                if custom_config_path.is_some() {
                    return Err(ConfigError::FileNotFound(
                        config_path.to_string_lossy().to_string(),
                    ));
                }
                continue;
            }

            let contents = fs::read_to_string(&config_path)?;

            log::info!("Loading configuration from: {}", config_path.display());

            let config_filename = config_path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("");

            match config_filename {
                "serve.json" => {
                    config = serde_json::from_str(&contents)
                        .map_err(|e| ConfigError::ParseError(format!("serve.json: {}", e)))?;
                }
                "now.json" => {
                    #[derive(Deserialize)]
                    struct NowConfig {
                        now: Option<NowStatic>,
                    }

                    #[derive(Deserialize)]
                    struct NowStatic {
                        #[serde(rename = "static")]
                        static_config: Option<Configuration>,
                    }

                    let now_config: NowConfig = serde_json::from_str(&contents)
                        .map_err(|e| ConfigError::ParseError(format!("now.json: {}", e)))?;

                    if let Some(now) = now_config.now {
                        if let Some(static_config) = now.static_config {
                            config = static_config;
                        }
                    }

                    log::warn!("The config file `now.json` is deprecated. Please use `serve.json`.");
                }
                "package.json" => {
                    #[derive(Deserialize)]
                    struct PackageJson {
                        #[serde(rename = "static")]
                        static_config: Option<Configuration>,
                    }

                    let package_json: PackageJson = serde_json::from_str(&contents)
                        .map_err(|e| ConfigError::ParseError(format!("package.json: {}", e)))?;

                    if let Some(static_config) = package_json.static_config {
                        config = static_config;
                    }

                    log::warn!("The config file `package.json` (static section) is deprecated. Please use `serve.json`.");
                }
                _ => {}
            }

            break; // Found and loaded a config file, stop looking
        }

        // Resolve the public directory path relative to the serve directory
        if let Some(ref public_dir) = config.public {
            let public_path = if Path::new(public_dir).is_absolute() {
                PathBuf::from(public_dir)
            } else {
                self.serve_dir.join(public_dir)
            };

            let relative_path = public_path
                .strip_prefix(&self.current_dir)
                .unwrap_or(&public_path);

            config.public = Some(relative_path.to_string_lossy().to_string());
        } else {
            let relative_path = self
                .serve_dir
                .strip_prefix(&self.current_dir)
                .unwrap_or(&self.serve_dir);

            config.public = Some(relative_path.to_string_lossy().to_string());
        }

        self.validate_config(&config)?;

        Ok(config)
    }

    fn validate_config(&self, config: &Configuration) -> Result<(), ConfigError> {
        if let Some(ref public_dir) = config.public {
            let public_path = if Path::new(public_dir).is_absolute() {
                PathBuf::from(public_dir)
            } else {
                self.serve_dir.join(public_dir)
            };

            if !public_path.exists() {
                return Err(ConfigError::ValidationError(format!(
                    "Public directory does not exist: {}",
                    public_path.display()
                )));
            }
        }

        Ok(())
    }
}
