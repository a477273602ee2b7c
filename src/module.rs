//! Module (Plugin) Boundary
//!
//! A module announces what it contributes through a capability mask and
//! hands the engine factories for components, systems and resource loaders.
//! The dynamic-library mechanics live outside the core; the engine only
//! consumes this trait and registers/unregisters factories by type name.

use bitflags::bitflags;

use crate::resources::ResourceLoader;
use crate::scene::ComponentFactory;
use crate::system::System;

bitflags! {
    /// What a module contributes.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct Capabilities: u32 {
        /// Provides one or more systems.
        const SYSTEM    = 1 << 0;
        /// Provides component types.
        const EXTENSION = 1 << 1;
        /// Provides resource loaders/converters.
        const CONVERTER = 1 << 2;
    }
}

/// Contribution surface of a loadable module.
pub trait Module {
    fn name(&self) -> &'static str;

    fn capabilities(&self) -> Capabilities;

    /// Component factories keyed by type name.
    fn components(&self) -> Vec<(&'static str, ComponentFactory)> {
        Vec::new()
    }

    /// Systems to append to the frame schedule, in order.
    fn systems(&mut self) -> Vec<Box<dyn System>> {
        Vec::new()
    }

    /// Resource loaders to append to the resolution chain.
    fn loaders(&mut self) -> Vec<Box<dyn ResourceLoader>> {
        Vec::new()
    }
}
