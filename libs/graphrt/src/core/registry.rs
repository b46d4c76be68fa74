//! [`ElementFactory`] — process-wide registry mapping element type names to
//! constructors.
//!
//! Mirrors the reference lineage's `DescriptorProvider` + `inventory::submit!`
//! pattern (see `registry.rs` in the sibling `streamlib` crate this runtime
//! is modeled on): compile-time registration via [`register_element`],
//! collected lazily into a process-wide singleton on first access.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

use crate::core::element::Element;
use crate::core::error::{GraphError, Result};

/// Implemented by the hidden provider type [`register_element`] generates;
/// not meant to be implemented by hand.
pub trait ElementConstructorProvider: Sync {
    fn name(&self) -> &'static str;
    fn construct(&self) -> Box<dyn Element>;
}

inventory::collect!(&'static dyn ElementConstructorProvider);

/// Register an element type for auto-discovery by [`ElementFactory`].
///
/// ```ignore
/// struct Passthrough;
/// impl Element for Passthrough { /* ... */ }
/// graphrt::register_element!("Passthrough", Passthrough::default);
/// ```
#[macro_export]
macro_rules! register_element {
    ($name:expr, $ctor:expr) => {
        const _: () = {
            struct __ElementProvider;

            impl $crate::core::registry::ElementConstructorProvider for __ElementProvider {
                fn name(&self) -> &'static str {
                    $name
                }

                fn construct(&self) -> Box<dyn $crate::core::element::Element> {
                    Box::new(($ctor)())
                }
            }

            inventory::submit! {
                &__ElementProvider as &dyn $crate::core::registry::ElementConstructorProvider
            }
        };
    };
}

type ConstructorFn = Arc<dyn Fn() -> Box<dyn Element> + Send + Sync>;

/// A process-wide registry mapping `name -> constructor`.
pub struct ElementFactory {
    constructors: RwLock<HashMap<String, ConstructorFn>>,
}

impl Default for ElementFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ElementFactory {
    pub fn new() -> Self {
        Self {
            constructors: RwLock::new(HashMap::new()),
        }
    }

    /// Register a constructor directly, bypassing `inventory`. Used for
    /// element types assembled at runtime (e.g. in tests).
    pub fn register<F>(&self, name: impl Into<String>, ctor: F)
    where
        F: Fn() -> Box<dyn Element> + Send + Sync + 'static,
    {
        self.constructors.write().insert(name.into(), Arc::new(ctor));
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.constructors.read().contains_key(name)
    }

    /// Construct a fresh element instance for `name`, or fail with
    /// [`GraphError::UnknownElement`].
    pub fn make(&self, name: &str) -> Result<Box<dyn Element>> {
        let constructors = self.constructors.read();
        let ctor = constructors
            .get(name)
            .ok_or_else(|| GraphError::UnknownElement(name.to_string()))?;
        Ok(ctor())
    }
}

static GLOBAL_FACTORY: OnceLock<Arc<ElementFactory>> = OnceLock::new();

/// The process-wide [`ElementFactory`]. On first access, collects every
/// constructor submitted at compile time via [`register_element`].
pub fn global_factory() -> Arc<ElementFactory> {
    GLOBAL_FACTORY
        .get_or_init(|| {
            let factory = ElementFactory::new();
            for provider in inventory::iter::<&dyn ElementConstructorProvider> {
                let name = provider.name();
                if factory.is_registered(name) {
                    tracing::warn!("duplicate element registration for '{}', ignoring", name);
                    continue;
                }
                factory.register(name, move || provider.construct());
            }
            tracing::info!("element factory initialized with {} element types", factory.constructors.read().len());
            Arc::new(factory)
        })
        .clone()
}
