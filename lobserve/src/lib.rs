//! Observability hooks for the provider and tool phases of an agent run.
//!
//! ```rust
//! use lobserve::{CombinedObservabilityHooks, SafeProviderHooks, TracingObservabilityHooks};
//! use lprovider::ProviderOperationHooks;
//!
//! fn accepts_provider_hooks(_hooks: &dyn ProviderOperationHooks) {}
//!
//! accepts_provider_hooks(&SafeProviderHooks::new(TracingObservabilityHooks));
//! accepts_provider_hooks(&CombinedObservabilityHooks::default());
//! ```

mod combined;
mod metrics_hooks;
mod safe_hooks;
mod tracing_hooks;

pub use combined::CombinedObservabilityHooks;
pub use metrics_hooks::MetricsObservabilityHooks;
pub use safe_hooks::{SafeProviderHooks, SafeToolHooks};
pub use tracing_hooks::TracingObservabilityHooks;

pub mod prelude {
    pub use crate::{
        CombinedObservabilityHooks, MetricsObservabilityHooks, SafeProviderHooks, SafeToolHooks,
        TracingObservabilityHooks,
    };
}

#[cfg(test)]
mod tests;
