//! Type definitions for deployment descriptors and runtime behaviour

mod extension_types;
mod runtime_config;

pub use extension_types::*;
pub use runtime_config::*;
