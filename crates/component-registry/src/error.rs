//! Error types for the component registry

use crate::lifecycle::{LifecycleOperation, LifecycleState};
use std::sync::Arc;
use thiserror::Error;

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors that can occur in the component registry
#[derive(Error, Debug, Clone)]
pub enum RegistryError {
    #[error("Component already registered: {0}")]
    DuplicateName(String),

    #[error("Component not found: {0}")]
    NotFound(String),

    #[error("Circular dependency detected: {}", .cycle.join(" -> "))]
    CircularDependency { cycle: Vec<String> },

    #[error("Component {component} has unregistered dependencies: {}", .missing.join(", "))]
    MissingDependency {
        component: String,
        missing: Vec<String>,
    },

    #[error("Component {component} depends on {dependency}, which has not been initialized")]
    DependencyNotReady {
        component: String,
        dependency: String,
    },

    #[error("Cannot {operation} component {component} in state {state}")]
    InvalidState {
        component: String,
        operation: LifecycleOperation,
        state: LifecycleState,
    },

    #[error("Component {component} failed to {operation}: {cause}")]
    Callback {
        component: String,
        operation: LifecycleOperation,
        cause: Arc<anyhow::Error>,
    },
}

impl RegistryError {
    /// Name of the component the error is about, if it concerns a single one
    pub fn component(&self) -> Option<&str> {
        match self {
            RegistryError::DuplicateName(name) | RegistryError::NotFound(name) => Some(name),
            RegistryError::CircularDependency { .. } => None,
            RegistryError::MissingDependency { component, .. }
            | RegistryError::DependencyNotReady { component, .. }
            | RegistryError::InvalidState { component, .. }
            | RegistryError::Callback { component, .. } => Some(component),
        }
    }

    /// The error raised by a component's own callback, if this is a callback failure
    pub fn callback_cause(&self) -> Option<&anyhow::Error> {
        match self {
            RegistryError::Callback { cause, .. } => Some(&**cause),
            _ => None,
        }
    }
}
