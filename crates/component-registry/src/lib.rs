//! Component Lifecycle Registry
//!
//! Supervises independently developed components of a process:
//! - Registration of named components with declared dependencies
//! - Deterministic dependency ordering with cycle detection
//! - Initialize / start / stop driven in dependency order (stop in reverse)
//! - Read-only introspection of component states
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Component Registry                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────┐         │
//! │  │ Dependency  │  │  Lifecycle  │  │  Lifecycle  │         │
//! │  │  Resolver   │  │   Driver    │  │   Events    │         │
//! │  └─────────────┘  └─────────────┘  └─────────────┘         │
//! ├─────────────────────────────────────────────────────────────┤
//! │                  Registry Entries                           │
//! │          (component, state, last error)                     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use component_registry::{Component, ComponentRegistry};
//!
//! # async fn bootstrap() -> component_registry::RegistryResult<()> {
//! let registry = ComponentRegistry::new();
//! registry.register(Component::new("audit-log", "1.0.0").on_init(|| async { Ok(()) }))?;
//! registry.register(Component::new("crypto", "2.1.0").depends_on("audit-log"))?;
//!
//! registry.initialize_all().await?;
//! registry.start_all().await?;
//! // ...
//! registry.stop_all().await?;
//! # Ok(())
//! # }
//! ```

pub mod component;
pub mod error;
pub mod lifecycle;
pub mod registry;
pub mod resolver;

pub use component::{Component, LifecycleHook, LifecycleHooks};
pub use error::{RegistryError, RegistryResult};
pub use lifecycle::{Admission, LifecycleEvent, LifecycleOperation, LifecycleState, Outcome};
pub use registry::{ComponentInfo, ComponentRegistry, LifecycleFailure, RegistryEntry};
pub use resolver::DependencyGraph;
