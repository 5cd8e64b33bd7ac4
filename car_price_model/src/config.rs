use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ModelConfig {
    #[serde(
        default = "default_optimization_level",
        deserialize_with = "deserialize_optimization_level"
    )]
    pub optimization_level: OptimizationLevel,
    #[serde(default = "default_intra_threads")]
    pub intra_threads: usize,
    /// Directory the uploaded artifact is written to before loading.
    /// Nothing is written when unset.
    #[serde(default)]
    pub persist_dir: Option<PathBuf>,
}

fn default_optimization_level() -> OptimizationLevel {
    OptimizationLevel::Level3
}

fn default_intra_threads() -> usize {
    1
}

fn deserialize_optimization_level<'de, D>(deserializer: D) -> Result<OptimizationLevel, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.try_into().map_err(serde::de::Error::custom)
}

impl ModelConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.intra_threads == 0 {
            return Err("model.intra_threads must be at least 1".to_string());
        }
        if let Some(dir) = &self.persist_dir {
            if dir.exists() && !dir.is_dir() {
                return Err(format!("model.persist_dir is not a directory: {:?}", dir));
            }
        }
        Ok(())
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            optimization_level: default_optimization_level(),
            intra_threads: default_intra_threads(),
            persist_dir: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum OptimizationLevel {
    Disable,
    Level1,
    Level2,
    Level3,
}

impl OptimizationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            OptimizationLevel::Disable => "disable",
            OptimizationLevel::Level1 => "level1",
            OptimizationLevel::Level2 => "level2",
            OptimizationLevel::Level3 => "level3",
        }
    }
}

impl TryFrom<String> for OptimizationLevel {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "disable" => Ok(Self::Disable),
            "level1" => Ok(Self::Level1),
            "level2" => Ok(Self::Level2),
            "level3" => Ok(Self::Level3),
            other => Err(format!(
                "{} is not a supported optimization level. Use one of `disable`, `level1`, `level2` or `level3`.",
                other
            )),
        }
    }
}
