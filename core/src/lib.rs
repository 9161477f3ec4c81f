// core/src/lib.rs

//! Step pipelines for storefront workflows.
//!
//! A pipeline is an ordered list of named steps. Each step can carry
//! `before`, `on` and `after` handlers; handlers receive a shared
//! [`ContextData`] and decide whether the run continues or stops.
//!
//! Pipelines are registered in a [`FlowRegistry`], keyed by the type of
//! context they operate on, so callers only need to build a context and
//! hand it to [`FlowRegistry::run`].

pub mod context;
pub mod control;
pub mod error;
pub mod pipeline;
pub mod registry;
pub mod step;

pub use crate::context::ContextData;
pub use crate::control::{PipelineControl, PipelineResult};
pub use crate::error::{FlowError, FlowResult};
pub use crate::pipeline::Pipeline;
pub use crate::registry::FlowRegistry;
pub use crate::step::{Handler, SkipCondition, StepDef};
