//! Installation strategy selection and execution

pub mod pipeline;
pub mod strategy;

pub use pipeline::{InstallPipeline, PipelineState};
pub use strategy::InstallStrategy;
