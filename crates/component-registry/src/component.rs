//! Component definitions supplied by subsystems

use crate::lifecycle::LifecycleOperation;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// An asynchronous, zero-argument lifecycle callback
pub type LifecycleHook = Arc<dyn Fn() -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

fn into_hook<F, Fut>(hook: F) -> LifecycleHook
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(move || hook().boxed())
}

/// The optional callbacks a component exposes.
///
/// A missing hook makes the matching transition a plain state change.
#[derive(Clone, Default)]
pub struct LifecycleHooks {
    pub on_init: Option<LifecycleHook>,
    pub on_start: Option<LifecycleHook>,
    pub on_stop: Option<LifecycleHook>,
    pub on_destroy: Option<LifecycleHook>,
}

impl LifecycleHooks {
    /// Hook run by the given operation, if the component supplied one
    pub fn for_operation(&self, operation: LifecycleOperation) -> Option<LifecycleHook> {
        match operation {
            LifecycleOperation::Initialize => self.on_init.clone(),
            LifecycleOperation::Start => self.on_start.clone(),
            LifecycleOperation::Stop => self.on_stop.clone(),
            LifecycleOperation::Destroy => self.on_destroy.clone(),
        }
    }
}

impl fmt::Debug for LifecycleHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleHooks")
            .field("on_init", &self.on_init.is_some())
            .field("on_start", &self.on_start.is_some())
            .field("on_stop", &self.on_stop.is_some())
            .field("on_destroy", &self.on_destroy.is_some())
            .finish()
    }
}

/// A named unit of the process with declared dependencies and optional hooks
#[derive(Clone, Debug)]
pub struct Component {
    /// Unique name, used as the registry key
    pub name: String,
    /// Informational version string
    pub version: String,
    /// Names of components that must be initialized first, in declared order
    pub dependencies: Vec<String>,
    /// Lifecycle callbacks
    pub hooks: LifecycleHooks,
}

impl Component {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            dependencies: Vec::new(),
            hooks: LifecycleHooks::default(),
        }
    }

    /// Add a dependency. Duplicates are ignored.
    pub fn depends_on(mut self, dependency: impl Into<String>) -> Self {
        let dependency = dependency.into();
        if !self.dependencies.contains(&dependency) {
            self.dependencies.push(dependency);
        }
        self
    }

    pub fn with_dependencies<I, S>(self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        dependencies
            .into_iter()
            .fold(self, |component, dependency| component.depends_on(dependency))
    }

    pub fn on_init<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.hooks.on_init = Some(into_hook(hook));
        self
    }

    pub fn on_start<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.hooks.on_start = Some(into_hook(hook));
        self
    }

    pub fn on_stop<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.hooks.on_stop = Some(into_hook(hook));
        self
    }

    pub fn on_destroy<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.hooks.on_destroy = Some(into_hook(hook));
        self
    }

    pub fn with_hooks(mut self, hooks: LifecycleHooks) -> Self {
        self.hooks = hooks;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_component_builder() {
        let component = Component::new("compliance", "0.3.1")
            .depends_on("crypto")
            .with_dependencies(["audit-log", "crypto"]);

        assert_eq!(component.name, "compliance");
        assert_eq!(component.version, "0.3.1");
        assert_eq!(component.dependencies, vec!["crypto", "audit-log"]);
        assert!(component.hooks.on_init.is_none());
    }

    #[test]
    fn test_hooks_debug_shows_presence_only() {
        let component = Component::new("crypto", "1.0.0").on_init(|| async { Ok(()) });
        let debug = format!("{:?}", component.hooks);

        assert!(debug.contains("on_init: true"), "got: {}", debug);
        assert!(debug.contains("on_stop: false"), "got: {}", debug);
    }

    #[tokio::test]
    async fn test_hook_for_operation() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let component = Component::new("scanner", "2.0.0").on_start(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        let hook = component
            .hooks
            .for_operation(LifecycleOperation::Start)
            .expect("start hook");
        hook().await.unwrap();
        hook().await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(component
            .hooks
            .for_operation(LifecycleOperation::Initialize)
            .is_none());
    }
}
