use super::traits::{Observer, ObserverEvent};

/// Zero-overhead observer: all methods compile to nothing
pub struct NoopObserver;

impl Observer for NoopObserver {
    #[inline(always)]
    fn record_event(&self, _event: &ObserverEvent) -> anyhow::Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "noop"
    }
}
