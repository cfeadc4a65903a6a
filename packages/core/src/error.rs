//! Error types for the reconciliation engine

use crate::config::ConfigError;
use crate::element::PrimitiveKind;
use crate::tree::NodeId;
use std::fmt;
use thiserror::Error;

/// Error type returned by user components and backend factories
pub type BoxError = Box<dyn std::error::Error>;

pub type ReconcileResult<T> = Result<T, ReconcileError>;

#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("Invalid element type '{name}'")]
    InvalidElementType { name: String },

    #[error("Unrecognized component {id:?}: not a live custom or primitive node")]
    UnrecognizedComponent { id: NodeId },

    #[error("Keyed child at index {index} under '{component}' has no key prop")]
    MissingKey { index: usize, component: String },

    #[error(transparent)]
    RenderBoundary(#[from] RenderBoundaryError),

    #[error("Factory failed to create '{kind}': {message}")]
    Factory { kind: PrimitiveKind, message: String },

    #[error("Tree depth limit of {limit} exceeded (runaway recursive rendering?)")]
    DepthLimit { limit: usize },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Point in a component's life where user code ran
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePhase {
    Render,
    WillMount,
    DidMount,
    WillUnmount,
    DidUpdate,
    WillReceiveProps,
}

impl fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecyclePhase::Render => "render",
            LifecyclePhase::WillMount => "will_mount",
            LifecyclePhase::DidMount => "did_mount",
            LifecyclePhase::WillUnmount => "will_unmount",
            LifecyclePhase::DidUpdate => "did_update",
            LifecyclePhase::WillReceiveProps => "will_receive_props",
        };
        f.write_str(name)
    }
}

/// Failure raised by `render()` or a lifecycle hook
#[derive(Error, Debug)]
#[error("Component '{component}' failed in {phase}: {source}")]
pub struct RenderBoundaryError {
    pub component: String,
    pub phase: LifecyclePhase,
    #[source]
    pub source: BoxError,
}

impl RenderBoundaryError {
    pub fn new(component: impl Into<String>, phase: LifecyclePhase, source: BoxError) -> Self {
        Self {
            component: component.into(),
            phase,
            source,
        }
    }
}
