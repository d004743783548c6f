//! # Core
//!
//! The orchestration layer: providers fetch data concurrently into a
//! [`RenderContext`], components render it in configured order, and the
//! [`Registry`] decides which of them exist for a given run.

pub mod caching;
pub mod component;
pub mod context;
pub mod provider;
pub mod registry;
pub mod statusline;

pub use caching::CachingProvider;
pub use component::Component;
pub use context::RenderContext;
pub use provider::{Payload, ProvideContext, Provider, ProviderData, ProviderError, ProviderKey, payload};
pub use registry::{PayloadDecoder, ProviderSpec, Registry, decode_as};
pub use statusline::StatusLine;
