//! # Registry Configuration
//!
//! Loaded once at startup from TOML.
//!
//! ```toml
//! # data/registry.toml
//! max_entities = 100000
//! initial_component_capacity = 4096
//! ```
//!
//! Every key is optional; missing keys take the defaults below.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EcsError, EcsResult};

/// Default entity universe.
pub const DEFAULT_MAX_ENTITIES: u32 = 65_536;

/// Default payload slots reserved per component store.
pub const DEFAULT_COMPONENT_CAPACITY: usize = 1_024;

/// Sizing of a [`Registry`](crate::Registry).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
    /// Exclusive upper bound of entity ids, shared by every sparse set.
    ///
    /// Ids are never recycled, so this also caps lifetime entity creation.
    pub max_entities: u32,
    /// Payload slots each component store reserves when created.
    pub initial_component_capacity: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_entities: DEFAULT_MAX_ENTITIES,
            initial_component_capacity: DEFAULT_COMPONENT_CAPACITY,
        }
    }
}

impl RegistryConfig {
    /// Creates a config for `max_entities` ids with the default reservation
    /// clamped to fit.
    #[must_use]
    pub fn with_max_entities(max_entities: u32) -> Self {
        Self {
            max_entities,
            initial_component_capacity: DEFAULT_COMPONENT_CAPACITY.min(max_entities as usize),
        }
    }

    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidConfig`] if the document does not parse or fails
    /// validation.
    pub fn from_toml_str(source: &str) -> EcsResult<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| EcsError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// [`EcsError::ConfigIo`] if the file cannot be read, otherwise as
    /// [`RegistryConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> EcsResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| EcsError::ConfigIo(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&source)
    }

    /// Checks the sizing is usable.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidConfig`] if the universe is empty or the
    /// reservation exceeds it.
    pub fn validate(&self) -> EcsResult<()> {
        if self.max_entities == 0 {
            return Err(EcsError::InvalidConfig(
                "max_entities must be greater than zero".into(),
            ));
        }
        // `u32::MAX` is the null id and never a member.
        if self.max_entities == u32::MAX {
            return Err(EcsError::InvalidConfig(
                "max_entities must be below u32::MAX".into(),
            ));
        }
        if self.initial_component_capacity > self.max_entities as usize {
            return Err(EcsError::InvalidConfig(format!(
                "initial_component_capacity {} exceeds max_entities {}",
                self.initial_component_capacity, self.max_entities
            )));
        }
        Ok(())
    }
}
