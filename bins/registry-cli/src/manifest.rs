//! Component manifest
//!
//! A TOML file listing the components to register. Hooks are simulated:
//! each one sleeps for its configured delay and can be told to fail.

use anyhow::{Context, Result};
use component_registry::{Component, ComponentRegistry, LifecycleOperation};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub components: Vec<ComponentSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentSpec {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub init_delay_ms: u64,
    #[serde(default)]
    pub start_delay_ms: u64,
    #[serde(default)]
    pub stop_delay_ms: u64,
    /// Hook that should fail, for rehearsing failure handling
    #[serde(default)]
    pub fail_on: Option<FailurePoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePoint {
    Init,
    Start,
    Stop,
}

impl FailurePoint {
    fn operation(self) -> LifecycleOperation {
        match self {
            FailurePoint::Init => LifecycleOperation::Initialize,
            FailurePoint::Start => LifecycleOperation::Start,
            FailurePoint::Stop => LifecycleOperation::Stop,
        }
    }
}

fn default_version() -> String {
    "0.0.0".to_string()
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest from {}", path.display()))?;
        let manifest = Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse manifest at {}", path.display()))?;
        debug!(
            path = %path.display(),
            components = manifest.components.len(),
            "Manifest loaded"
        );
        Ok(manifest)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let manifest: Manifest = toml::from_str(contents)?;
        manifest.validate()?;
        Ok(manifest)
    }

    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for spec in &self.components {
            if spec.name.trim().is_empty() {
                anyhow::bail!("Component name must not be empty");
            }
            if !seen.insert(spec.name.as_str()) {
                anyhow::bail!("Component '{}' is declared more than once", spec.name);
            }
        }
        Ok(())
    }

    /// Register every component of the manifest in a fresh registry
    pub fn build_registry(&self) -> Result<ComponentRegistry> {
        let registry = ComponentRegistry::new();
        for spec in &self.components {
            registry.register(spec.to_component())?;
        }
        Ok(registry)
    }
}

impl ComponentSpec {
    pub fn to_component(&self) -> Component {
        let hook = |operation: LifecycleOperation, delay_ms: u64| {
            let name = self.name.clone();
            let fail = self.fail_on.map(FailurePoint::operation) == Some(operation);
            move || {
                let name = name.clone();
                async move {
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    if fail {
                        anyhow::bail!("{} hook of {} configured to fail", operation, name);
                    }
                    info!(component = %name, %operation, "Simulated hook finished");
                    Ok(())
                }
            }
        };

        Component::new(&self.name, &self.version)
            .with_dependencies(self.dependencies.iter().cloned())
            .on_init(hook(LifecycleOperation::Initialize, self.init_delay_ms))
            .on_start(hook(LifecycleOperation::Start, self.start_delay_ms))
            .on_stop(hook(LifecycleOperation::Stop, self.stop_delay_ms))
    }
}
