// ABOUTME: YAML configuration blocks for each rollout phase.
// ABOUTME: Expression-valued fields stay strings; they render against the context at execute time.

use serde::{Deserialize, Deserializer};

use crate::model::{InstanceSpec, ResizeStrategy};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Configuration for the whole rollout: one block per phase.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RolloutConfig {
    #[serde(default)]
    pub setup: SetupConfig,

    #[serde(default)]
    pub deploy: DeployConfig,

    #[serde(default)]
    pub switch_routes: SwitchRoutesConfig,

    #[serde(default)]
    pub rollback: RollbackConfig,
}

impl RolloutConfig {
    pub fn from_yaml(yaml: &str) -> ConfigResult<Self> {
        serde_yaml::from_str(yaml).map_err(ConfigError::from)
    }
}

/// Setup phase configuration. Count fields may hold expressions like
/// `${workflow.variables.maxInstances}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SetupConfig {
    /// Scale-set name prefix; defaults to `app__service__env` when absent.
    #[serde(default)]
    pub name_prefix: Option<String>,

    #[serde(default)]
    pub desired_instances: Option<String>,

    #[serde(default)]
    pub min_instances: Option<String>,

    #[serde(default)]
    pub max_instances: Option<String>,

    /// Steady-state timeout expression, in minutes.
    #[serde(default)]
    pub timeout: Option<String>,

    #[serde(default)]
    pub resize_strategy: ResizeStrategy,
}

/// Deploy phase configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DeployConfig {
    #[serde(
        default = "default_instance_spec",
        deserialize_with = "deserialize_instance_spec"
    )]
    pub instances: InstanceSpec,

    #[serde(default)]
    pub timeout: Option<String>,
}

impl Default for DeployConfig {
    fn default() -> Self {
        DeployConfig {
            instances: default_instance_spec(),
            timeout: None,
        }
    }
}

fn default_instance_spec() -> InstanceSpec {
    InstanceSpec::Percentage(100)
}

fn deserialize_instance_spec<'de, D>(deserializer: D) -> Result<InstanceSpec, D::Error>
where
    D: Deserializer<'de>,
{
    let spec = InstanceSpec::deserialize(deserializer)?;
    if let InstanceSpec::Percentage(p) = spec {
        if p > 100 {
            return Err(serde::de::Error::custom(format!(
                "instance percentage must be at most 100, got {}",
                p
            )));
        }
    }
    Ok(spec)
}

/// SwitchRoutes phase configuration, shared by forward and rollback runs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SwitchRoutesConfig {
    #[serde(default)]
    pub downscale_old_scale_set: bool,

    #[serde(default)]
    pub timeout: Option<String>,
}

/// Rollback phase configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RollbackConfig {
    #[serde(default)]
    pub timeout: Option<String>,
}

impl SetupConfig {
    /// Baseline configuration used by tests and documentation.
    pub fn template() -> Self {
        SetupConfig {
            name_prefix: None,
            desired_instances: Some("2".to_string()),
            min_instances: Some("0".to_string()),
            max_instances: Some("4".to_string()),
            timeout: None,
            resize_strategy: ResizeStrategy::ResizeNewFirst,
        }
    }
}
