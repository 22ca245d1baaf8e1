use async_trait::async_trait;
use std::time::Duration;

/// Delay strategy between sequential generation calls
#[async_trait]
pub trait Pacer: Send + Sync {
    /// Called before the call at `index`; implementations wait only when `index > 0`
    async fn pause(&self, index: usize);
}

/// Sleeps a fixed duration before every call after the first
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay(pub Duration);

impl FixedDelay {
    pub fn from_millis(ms: u64) -> Self {
        Self(Duration::from_millis(ms))
    }
}

#[async_trait]
impl Pacer for FixedDelay {
    async fn pause(&self, index: usize) {
        if index > 0 && !self.0.is_zero() {
            tracing::trace!("Pacing next generation call by {:?}", self.0);
            tokio::time::sleep(self.0).await;
        }
    }
}

/// Never waits
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

#[async_trait]
impl Pacer for NoDelay {
    async fn pause(&self, _index: usize) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fixed_delay_skips_first_call() {
        let pacer = FixedDelay::from_millis(50);

        let start = tokio::time::Instant::now();
        pacer.pause(0).await;
        assert!(start.elapsed() < Duration::from_millis(50));

        pacer.pause(1).await;
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn test_no_delay() {
        tokio_test::block_on(NoDelay.pause(5));
    }
}
