//! Wrappers that keep a panicking hook from unwinding into an agent run.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use lprovider::{ProviderError, ProviderId, ProviderOperationHooks, ToolCall};
use ltooling::{ToolCallHooks, ToolCallOutcome, ToolExecutionContext};

fn guarded(callback: &'static str, hook: impl FnOnce()) {
    if catch_unwind(AssertUnwindSafe(hook)).is_err() {
        tracing::warn!(callback, "observability hook panicked");
    }
}

pub struct SafeProviderHooks<H> {
    inner: H,
}

impl<H> SafeProviderHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> ProviderOperationHooks for SafeProviderHooks<H>
where
    H: ProviderOperationHooks,
{
    fn on_attempt_start(&self, provider: ProviderId, operation: &str, attempt: u32) {
        guarded("on_attempt_start", || {
            self.inner.on_attempt_start(provider, operation, attempt)
        });
    }

    fn on_retry_scheduled(
        &self,
        provider: ProviderId,
        operation: &str,
        attempt: u32,
        delay: Duration,
        error: &ProviderError,
    ) {
        guarded("on_retry_scheduled", || {
            self.inner
                .on_retry_scheduled(provider, operation, attempt, delay, error)
        });
    }

    fn on_success(&self, provider: ProviderId, operation: &str, attempts: u32) {
        guarded("on_success", || {
            self.inner.on_success(provider, operation, attempts)
        });
    }

    fn on_failure(
        &self,
        provider: ProviderId,
        operation: &str,
        attempts: u32,
        error: &ProviderError,
    ) {
        guarded("on_failure", || {
            self.inner.on_failure(provider, operation, attempts, error)
        });
    }
}

pub struct SafeToolHooks<H> {
    inner: H,
}

impl<H> SafeToolHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> ToolCallHooks for SafeToolHooks<H>
where
    H: ToolCallHooks,
{
    fn on_call_started(&self, call: &ToolCall, context: &ToolExecutionContext) {
        guarded("on_call_started", || self.inner.on_call_started(call, context));
    }

    fn on_call_finished(
        &self,
        call: &ToolCall,
        context: &ToolExecutionContext,
        outcome: ToolCallOutcome<'_>,
        elapsed: Duration,
    ) {
        guarded("on_call_finished", || {
            self.inner.on_call_finished(call, context, outcome, elapsed)
        });
    }
}
