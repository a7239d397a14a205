//! Main component registry implementation

use crate::component::{Component, LifecycleHook};
use crate::error::{RegistryError, RegistryResult};
use crate::lifecycle::{Admission, LifecycleEvent, LifecycleOperation, LifecycleState, Outcome};
use crate::resolver::DependencyGraph;
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Failure captured on the most recent failed transition
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleFailure {
    /// Operation whose callback failed
    pub operation: LifecycleOperation,
    /// Rendered error chain
    pub message: String,
    /// Failure timestamp (millis)
    pub failed_at: i64,
}

/// A registered component with its mutable lifecycle fields
#[derive(Clone, Debug)]
pub struct RegistryEntry {
    pub component: Component,
    pub state: LifecycleState,
    pub last_error: Option<LifecycleFailure>,
    /// Set once the destroy callback has been started; the entry can no longer be started
    pub destroyed: bool,
    /// Registration timestamp (millis)
    pub registered_at: i64,
    /// Last state change timestamp (millis)
    pub updated_at: i64,
}

impl RegistryEntry {
    fn new(component: Component) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            component,
            state: LifecycleState::Uninitialized,
            last_error: None,
            destroyed: false,
            registered_at: now,
            updated_at: now,
        }
    }

    pub fn name(&self) -> &str {
        &self.component.name
    }

    fn summary(&self) -> ComponentInfo {
        ComponentInfo {
            name: self.component.name.clone(),
            version: self.component.version.clone(),
            state: self.state,
        }
    }

    fn set_state(&mut self, new_state: LifecycleState) -> LifecycleState {
        let old_state = self.state;
        self.state = new_state;
        self.updated_at = chrono::Utc::now().timestamp_millis();
        old_state
    }
}

/// Snapshot row returned by [`ComponentRegistry::list`]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentInfo {
    pub name: String,
    pub version: String,
    pub state: LifecycleState,
}

type LifecycleListener = Arc<dyn Fn(&LifecycleEvent) + Send + Sync>;

/// What `begin` decided for a single lifecycle call
enum Step {
    Skip(LifecycleState),
    Run {
        hook: Option<LifecycleHook>,
        old_state: LifecycleState,
        new_state: LifecycleState,
    },
}

/// Supervises named components and drives them through their lifecycle
/// in dependency order.
///
/// The registry is meant to be built by the process bootstrap and shared
/// by `Arc`. No lock is held while a component callback is awaited.
pub struct ComponentRegistry {
    /// Entries keyed by name, in registration order
    entries: RwLock<IndexMap<String, RegistryEntry>>,
    /// Order computed by the last `initialize_all`
    resolved_order: RwLock<Vec<String>>,
    /// Event listeners
    event_listeners: RwLock<Vec<LifecycleListener>>,
}

impl ComponentRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(IndexMap::new()),
            resolved_order: RwLock::new(Vec::new()),
            event_listeners: RwLock::new(Vec::new()),
        }
    }

    /// Register a new component in the `Uninitialized` state
    pub fn register(&self, component: Component) -> RegistryResult<()> {
        let name = component.name.clone();
        {
            let mut entries = self.entries.write();
            if entries.contains_key(&name) {
                return Err(RegistryError::DuplicateName(name));
            }

            info!(
                component = %name,
                version = %component.version,
                dependencies = ?component.dependencies,
                "Component registered"
            );
            entries.insert(name.clone(), RegistryEntry::new(component));
        }

        self.emit_event(LifecycleEvent::Registered { name });
        Ok(())
    }

    /// Get a snapshot of a component's entry
    pub fn get(&self, name: &str) -> Option<RegistryEntry> {
        self.entries.read().get(name).cloned()
    }

    /// Current state of a component
    pub fn get_state(&self, name: &str) -> Option<LifecycleState> {
        self.entries.read().get(name).map(|e| e.state)
    }

    /// Error recorded by the component's most recent failed transition
    pub fn last_error(&self, name: &str) -> Option<LifecycleFailure> {
        self.entries
            .read()
            .get(name)
            .and_then(|e| e.last_error.clone())
    }

    /// List all registered components in registration order
    pub fn list(&self) -> Vec<ComponentInfo> {
        self.entries.read().values().map(|e| e.summary()).collect()
    }

    /// True if the component is registered and initialized or running
    pub fn is_operational(&self, name: &str) -> bool {
        self.get_state(name)
            .map(|state| state.is_operational())
            .unwrap_or(false)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.read().contains_key(name)
    }

    /// Component count
    pub fn count(&self) -> usize {
        self.entries.read().len()
    }

    /// Order cached by the last `initialize_all`
    pub fn resolved_order(&self) -> Vec<String> {
        self.resolved_order.read().clone()
    }

    /// Unregistered dependency names per component, registration order
    pub fn missing_dependencies(&self) -> Vec<(String, Vec<String>)> {
        let graph = self.dependency_graph();
        self.entries
            .read()
            .keys()
            .filter_map(|name| {
                let missing = graph.missing_dependencies(name);
                (!missing.is_empty()).then(|| (name.clone(), missing))
            })
            .collect()
    }

    fn dependency_graph(&self) -> DependencyGraph {
        self.entries
            .read()
            .values()
            .map(|e| (e.component.name.as_str(), e.component.dependencies.as_slice()))
            .collect()
    }

    /// Compute a dependency-respecting order over all registered components
    pub fn resolve_order(&self) -> RegistryResult<Vec<String>> {
        self.dependency_graph().resolve()
    }

    /// Run a component's init callback once its dependencies have begun initializing
    pub async fn initialize(&self, name: &str) -> RegistryResult<Outcome> {
        self.drive(name, LifecycleOperation::Initialize).await
    }

    /// Resolve the order, cache it, and initialize every component in it.
    ///
    /// Stops at the first failure; later components stay uninitialized.
    pub async fn initialize_all(&self) -> RegistryResult<Vec<String>> {
        let order = self.resolve_order()?;
        *self.resolved_order.write() = order.clone();

        info!(order = ?order, "Initializing components");
        for name in &order {
            self.initialize(name).await?;
        }

        Ok(order)
    }

    /// Run a component's start callback. Restarting a stopped component is allowed.
    pub async fn start(&self, name: &str) -> RegistryResult<Outcome> {
        self.drive(name, LifecycleOperation::Start).await
    }

    /// Start every component in the cached order
    pub async fn start_all(&self) -> RegistryResult<()> {
        let order = self.resolved_order();
        if order.is_empty() {
            debug!("No resolved order cached; nothing to start");
        }

        for name in &order {
            self.start(name).await?;
        }
        Ok(())
    }

    /// Run a component's stop callback.
    ///
    /// A component that was never initialized, is already stopped, or is
    /// currently stopping is left alone. A concurrent caller does not wait
    /// for an in-flight stop.
    pub async fn stop(&self, name: &str) -> RegistryResult<Outcome> {
        self.drive(name, LifecycleOperation::Stop).await
    }

    /// Stop every component in reverse of the cached order
    pub async fn stop_all(&self) -> RegistryResult<()> {
        let order = self.resolved_order();
        for name in order.iter().rev() {
            self.stop(name).await?;
        }
        Ok(())
    }

    /// Stop everything, then run destroy callbacks of stopped components in
    /// reverse of the cached order. Entries stay registered.
    ///
    /// Destroy runs at most once per component: a repeated shutdown skips
    /// destroyed components, and they refuse to start again.
    pub async fn shutdown(&self) -> RegistryResult<()> {
        self.stop_all().await?;

        let order = self.resolved_order();
        for name in order.iter().rev() {
            self.drive(name, LifecycleOperation::Destroy).await?;
        }

        info!(components = order.len(), "Registry shut down");
        Ok(())
    }

    /// Single path for every lifecycle call: admit, run the hook, record the result
    async fn drive(&self, name: &str, operation: LifecycleOperation) -> RegistryResult<Outcome> {
        let (hook, in_progress) = match self.begin(name, operation)? {
            Step::Skip(state) => {
                debug!(component = %name, %operation, state = %state, "Lifecycle call skipped");
                return Ok(Outcome::Skipped(state));
            }
            Step::Run {
                hook,
                old_state,
                new_state,
            } => {
                if old_state != new_state {
                    self.emit_event(LifecycleEvent::StateChanged {
                        name: name.to_string(),
                        old_state,
                        new_state,
                    });
                }
                (hook, new_state)
            }
        };

        let result = match hook {
            Some(hook) => hook().await,
            None => Ok(()),
        };

        self.complete(name, operation, in_progress, result)
    }

    /// Check preconditions and move the entry into its in-progress state
    fn begin(&self, name: &str, operation: LifecycleOperation) -> RegistryResult<Step> {
        let mut entries = self.entries.write();

        let entry = entries
            .get(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;

        let admission = if entry.destroyed {
            match operation {
                LifecycleOperation::Start => Admission::Rejected,
                _ => Admission::AlreadySatisfied,
            }
        } else {
            operation.admit(entry.state)
        };

        match admission {
            Admission::AlreadySatisfied => return Ok(Step::Skip(entry.state)),
            Admission::Rejected => {
                return Err(RegistryError::InvalidState {
                    component: name.to_string(),
                    operation,
                    state: entry.state,
                })
            }
            Admission::Proceed => {}
        }

        if operation == LifecycleOperation::Initialize {
            let dependencies = &entry.component.dependencies;

            let missing: Vec<String> = dependencies
                .iter()
                .filter(|dep| !entries.contains_key(dep.as_str()))
                .cloned()
                .collect();
            if !missing.is_empty() {
                return Err(RegistryError::MissingDependency {
                    component: name.to_string(),
                    missing,
                });
            }

            let not_ready = dependencies.iter().find(|dep| {
                entries
                    .get(dep.as_str())
                    .is_some_and(|d| d.state == LifecycleState::Uninitialized)
            });
            if let Some(dependency) = not_ready {
                return Err(RegistryError::DependencyNotReady {
                    component: name.to_string(),
                    dependency: dependency.clone(),
                });
            }
        }

        let entry = entries
            .get_mut(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;
        let hook = entry.component.hooks.for_operation(operation);
        if operation == LifecycleOperation::Destroy {
            entry.destroyed = true;
        }

        let new_state = operation.in_progress_state().unwrap_or(entry.state);
        debug_assert!(entry.state == new_state || entry.state.can_transition_to(new_state));
        let old_state = entry.set_state(new_state);

        Ok(Step::Run {
            hook,
            old_state,
            new_state,
        })
    }

    /// Record the callback result on the entry; failures move it to `Error` and are returned.
    ///
    /// If another caller moved the entry while the callback ran, the newer
    /// state is kept and the call reports `Skipped`.
    fn complete(
        &self,
        name: &str,
        operation: LifecycleOperation,
        in_progress: LifecycleState,
        result: anyhow::Result<()>,
    ) -> RegistryResult<Outcome> {
        let (old_state, new_state, outcome) = {
            let mut entries = self.entries.write();
            let entry = entries
                .get_mut(name)
                .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;

            match result {
                Ok(()) => {
                    let Some(target) = operation.completed_state() else {
                        debug!(component = %name, %operation, "Lifecycle hook completed");
                        return Ok(Outcome::Completed(entry.state));
                    };
                    if entry.state != in_progress {
                        // Another caller moved the entry while the hook ran
                        warn!(
                            component = %name,
                            %operation,
                            state = %entry.state,
                            "Lifecycle state changed during callback; keeping current state"
                        );
                        return Ok(Outcome::Skipped(entry.state));
                    }

                    let old_state = entry.set_state(target);
                    info!(component = %name, %operation, state = %target, "Lifecycle step completed");
                    (old_state, target, Ok(Outcome::Completed(target)))
                }
                Err(cause) => {
                    let message = format!("{:#}", cause);
                    warn!(component = %name, %operation, error = %message, "Lifecycle callback failed");

                    entry.last_error = Some(LifecycleFailure {
                        operation,
                        message,
                        failed_at: chrono::Utc::now().timestamp_millis(),
                    });
                    let old_state = entry.set_state(LifecycleState::Error);

                    let err = RegistryError::Callback {
                        component: name.to_string(),
                        operation,
                        cause: Arc::new(cause),
                    };
                    (old_state, LifecycleState::Error, Err(err))
                }
            }
        };

        if old_state != new_state {
            self.emit_event(LifecycleEvent::StateChanged {
                name: name.to_string(),
                old_state,
                new_state,
            });
        }

        outcome
    }

    /// Add event listener
    pub fn on_event<F>(&self, listener: F)
    where
        F: Fn(&LifecycleEvent) + Send + Sync + 'static,
    {
        self.event_listeners.write().push(Arc::new(listener));
    }

    /// Emit lifecycle event to all listeners.
    ///
    /// Listeners run on a snapshot of the list with no lock held, so they
    /// may call back into the registry, including `on_event`.
    fn emit_event(&self, event: LifecycleEvent) {
        let listeners = self.event_listeners.read().clone();
        for listener in &listeners {
            listener(&event);
        }
    }
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::new()
    }
}
