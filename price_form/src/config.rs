use car_price_model::config::ModelConfig;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(deserialize_with = "deserialize_log_level")]
    pub log_level: LogLevel,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub upload: UploadConfig,
}

fn deserialize_log_level<'de, D>(deserializer: D) -> Result<LogLevel, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.try_into().map_err(serde::de::Error::custom)
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn get_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct UploadConfig {
    #[serde(default = "default_max_upload_bytes")]
    pub max_bytes: usize,
}

fn default_max_upload_bytes() -> usize {
    256 * 1024 * 1024
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: default_max_upload_bytes(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. Use either `local` or `production`.",
                other
            )),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
        }
    }
}

impl TryFrom<String> for LogLevel {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" => Ok(Self::Warn),
            other => Err(format!(
                "{} is not a supported minimum log level. Use one of `debug`, `info` or `warn`.",
                other
            )),
        }
    }
}

pub fn get_configuration() -> Result<Config, config::ConfigError> {
    let base_path = std::env::current_dir()
        .map_err(|e| config::ConfigError::Message(format!("current directory: {}", e)))?;
    let configuration_directory = base_path.join("configuration");

    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(config::ConfigError::Message)?;

    let config = config::Config::builder()
        .add_source(config::File::from(
            configuration_directory.join("base.yaml"),
        ))
        .add_source(config::File::from(
            configuration_directory.join(format!("{}.yaml", environment.as_str())),
        ))
        .add_source(
            config::Environment::with_prefix("PF")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    let config: Config = config.try_deserialize::<Config>()?;
    config
        .model
        .validate()
        .map_err(config::ConfigError::Message)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use car_price_model::config::OptimizationLevel;
    use config::{File, FileFormat};

    fn parse(yaml: &str) -> Result<Config, config::ConfigError> {
        config::Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()?
            .try_deserialize::<Config>()
    }

    #[test]
    fn test_base_configuration_parses() {
        let config = parse(include_str!("../configuration/base.yaml")).unwrap();

        assert_eq!(config.server.get_address(), "0.0.0.0:8501");
        assert_eq!(config.log_level, LogLevel::Info);
        assert_eq!(config.model.optimization_level, OptimizationLevel::Level3);
        assert_eq!(config.upload.max_bytes, 256 * 1024 * 1024);
    }

    #[test]
    fn test_model_section_overrides() {
        let yaml = r#"
server:
  host: 127.0.0.1
  port: 9000
log_level: debug
model:
  optimization_level: disable
  intra_threads: 2
  persist_dir: /tmp/price_form
upload:
  max_bytes: 1024
"#;
        let config = parse(yaml).unwrap();

        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.model.optimization_level, OptimizationLevel::Disable);
        assert_eq!(config.model.intra_threads, 2);
        assert_eq!(
            config.model.persist_dir.as_deref(),
            Some(std::path::Path::new("/tmp/price_form"))
        );
        assert_eq!(config.upload.max_bytes, 1024);
    }

    #[test]
    fn test_unknown_log_level_is_rejected() {
        let yaml = "server: {host: localhost, port: 1}\nlog_level: trace\n";
        let err = parse(yaml).unwrap_err();
        assert!(err.to_string().contains("trace"));
    }
}
