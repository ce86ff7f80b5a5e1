//! Named adapter constructors.
//!
//! Registration is explicit: an adapter is added together with the
//! dependencies it needs, and a missing dependency fails the registration
//! instead of surfacing later when the adapter is used.

use std::fmt;

use tracing::debug;

use crate::adapter::Adapter;
use crate::request::RequestDescriptor;
use crate::{Error, Result};

pub type Constructor = fn(RequestDescriptor) -> Box<dyn Adapter>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dependency {
    pub name: &'static str,
    pub available: bool,
}

impl Dependency {
    /// A dependency provided by a cargo feature of this crate.
    pub const fn feature(name: &'static str, enabled: bool) -> Self {
        Dependency {
            name,
            available: enabled,
        }
    }
}

#[derive(Default)]
pub struct AdapterRegistry {
    // In registration order, which is also preference order.
    adapters: Vec<(&'static str, Constructor)>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every adapter compiled into this build.
    pub fn with_defaults() -> Result<Self> {
        #[allow(unused_mut)]
        let mut registry = Self::new();

        #[cfg(feature = "reqwest")]
        registry.register(
            "reqwest",
            &[Dependency::feature("reqwest", cfg!(feature = "reqwest"))],
            reqwest_adapter,
        )?;

        Ok(registry)
    }

    /// Adds `constructor` under `name`, replacing any earlier adapter of the
    /// same name.
    pub fn register(
        &mut self,
        name: &'static str,
        dependencies: &[Dependency],
        constructor: Constructor,
    ) -> Result<()> {
        if let Some(missing) = dependencies.iter().find(|dependency| !dependency.available) {
            return Err(Error::Registry(format!(
                "adapter {:?} requires {:?}, which is not available",
                name, missing.name
            )));
        }

        match self.adapters.iter_mut().find(|(known, _)| *known == name) {
            Some(entry) => entry.1 = constructor,
            None => self.adapters.push((name, constructor)),
        }
        debug!(adapter = name, "registered adapter");
        Ok(())
    }

    pub fn load(&self, name: &str) -> Result<Constructor> {
        self.adapters
            .iter()
            .find(|(known, _)| *known == name)
            .map(|(_, constructor)| *constructor)
            .ok_or_else(|| Error::Registry(format!("unknown adapter {:?}", name)))
    }

    pub fn build(&self, name: &str, request: RequestDescriptor) -> Result<Box<dyn Adapter>> {
        let constructor = self.load(name)?;
        Ok(constructor(request))
    }

    /// The most preferred adapter, if any is registered.
    pub fn default_adapter(&self) -> Option<&'static str> {
        self.adapters.first().map(|(name, _)| *name)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.adapters.iter().map(|(name, _)| *name)
    }
}

impl fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[cfg(feature = "reqwest")]
fn reqwest_adapter(request: RequestDescriptor) -> Box<dyn Adapter> {
    use crate::adapter::EngineAdapter;
    use crate::engine::reqwest::ReqwestEngine;

    Box::new(EngineAdapter::new(request, ReqwestEngine))
}
