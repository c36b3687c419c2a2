use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::RuntimeError;
use crate::handler_id::HandlerId;

pub const CONFIG_PATH_ENV: &str = "GEO_RUNTIME_CONFIG";
pub const CONFIG_FILE_NAME: &str = "runtime.toml";

/// Keys settable through `GEO_RUNTIME_*`; other variables with the prefix are ignored.
const OVERRIDABLE_KEYS: [&str; 6] = [
    "handler",
    "runtime_api",
    "task_root",
    "function_name",
    "log.level",
    "log.format",
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Handler identifier, `module.path:function`.
    pub handler: String,
    /// `host:port` of the platform Runtime API.
    pub runtime_api: String,
    pub task_root: String,
    #[serde(default)]
    pub function_name: Option<String>,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            handler: String::new(),
            runtime_api: "127.0.0.1:9001".to_string(),
            task_root: "/var/task".to_string(),
            function_name: None,
            log: LogConfig {
                level: "info".to_string(),
                format: LogFormat::Json,
            },
        }
    }
}

impl RuntimeConfig {
    /// Layered configuration: defaults, then the TOML file, then the
    /// platform variables, then `GEO_RUNTIME_*` overrides.
    pub fn figment(config_file: &Path) -> Figment {
        Figment::from(Serialized::defaults(RuntimeConfig::default()))
            .merge(Toml::file(config_file))
            .merge(
                Env::raw()
                    .only(&[
                        "_HANDLER",
                        "AWS_LAMBDA_RUNTIME_API",
                        "LAMBDA_TASK_ROOT",
                        "AWS_LAMBDA_FUNCTION_NAME",
                    ])
                    .map(|key| {
                        match key.as_str().to_ascii_lowercase().as_str() {
                            "_handler" => "handler",
                            "aws_lambda_runtime_api" => "runtime_api",
                            "lambda_task_root" => "task_root",
                            _ => "function_name",
                        }
                        .into()
                    }),
            )
            .merge(
                Env::prefixed("GEO_RUNTIME_")
                    .split("__")
                    .only(&OVERRIDABLE_KEYS),
            )
    }

    /// Location of the optional configuration file.
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return PathBuf::from(path);
        }
        let task_root =
            std::env::var("LAMBDA_TASK_ROOT").unwrap_or_else(|_| "/var/task".to_string());
        Path::new(&task_root).join(CONFIG_FILE_NAME)
    }

    pub fn load() -> Result<Self, RuntimeError> {
        Self::load_from(&Self::config_file_path())
    }

    pub fn load_from(config_file: &Path) -> Result<Self, RuntimeError> {
        let config: RuntimeConfig = Self::figment(config_file).extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), RuntimeError> {
        if self.handler.trim().is_empty() {
            return Err(RuntimeError::ConfigError {
                reason: "no handler configured (set _HANDLER)".to_string(),
            });
        }
        if self.runtime_api.trim().is_empty() {
            return Err(RuntimeError::ConfigError {
                reason: "runtime_api must not be empty".to_string(),
            });
        }
        Ok(())
    }

    pub fn handler_id(&self) -> Result<HandlerId, RuntimeError> {
        Ok(self.handler.parse::<HandlerId>()?)
    }
}
