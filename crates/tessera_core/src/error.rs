//! # Core Error Types
//!
//! All errors that can occur in the entity/component core.
//!
//! Every failure is local and logical: nothing here is transient, so no
//! operation is ever retried.

use thiserror::Error;

use crate::ecs::EntityId;

/// Errors that can occur in the entity/component core.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EcsError {
    /// Accessed a component the entity does not have.
    #[error("entity {entity} has no component {component}")]
    MissingComponent {
        /// The entity that was queried.
        entity: EntityId,
        /// Type name of the missing component.
        component: &'static str,
    },

    /// Added a component the entity already has.
    #[error("entity {entity} already has component {component}")]
    DuplicateComponent {
        /// The entity that already holds the component.
        entity: EntityId,
        /// Type name of the duplicated component.
        component: &'static str,
    },

    /// Attached a component to an entity that is not alive.
    #[error("entity {entity} is not alive")]
    DeadEntity {
        /// The destroyed or never-created entity.
        entity: EntityId,
    },

    /// Every id of the registry's universe has been issued.
    #[error("entity limit reached: {limit} ids issued, ids are never recycled")]
    EntityLimitReached {
        /// The configured entity universe.
        limit: u32,
    },

    /// Invalid configuration file.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    ConfigIo(String),
}

/// Result type for core operations.
pub type EcsResult<T> = Result<T, EcsError>;
