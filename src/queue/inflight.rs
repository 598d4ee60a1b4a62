use tokio::sync::watch;
use tracing::warn;

/// Count of accepted tasks that have not finished yet
///
/// Backed by a watch channel so any number of callers can wait for the
/// count to reach zero.
#[derive(Debug)]
pub struct InFlight {
    count: watch::Sender<usize>,
}

impl InFlight {
    pub fn new() -> Self {
        let (count, _) = watch::channel(0);
        Self { count }
    }

    pub fn begin(&self) {
        self.count.send_modify(|n| *n += 1);
    }

    pub fn finish(&self) {
        self.count.send_modify(|n| {
            if *n == 0 {
                warn!("In-flight counter finished below zero");
            } else {
                *n -= 1;
            }
        });
    }

    pub fn current(&self) -> usize {
        *self.count.borrow()
    }

    /// Resolve once no task is in flight
    pub async fn wait_idle(&self) {
        let mut rx = self.count.subscribe();
        // The sender lives in `self`, so this cannot observe a closed channel.
        let _ = rx.wait_for(|n| *n == 0).await;
    }
}

impl Default for InFlight {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_wait_idle_returns_immediately_at_zero() {
        let in_flight = InFlight::new();
        tokio::time::timeout(Duration::from_millis(100), in_flight.wait_idle())
            .await
            .expect("should not wait at zero");
    }

    #[tokio::test]
    async fn test_wait_idle_blocks_until_finished() {
        let in_flight = Arc::new(InFlight::new());
        in_flight.begin();
        in_flight.begin();

        let waiter = {
            let in_flight = in_flight.clone();
            tokio::spawn(async move { in_flight.wait_idle().await })
        };

        in_flight.finish();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        in_flight.finish();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(in_flight.current(), 0);
    }

    #[test]
    fn test_finish_never_underflows() {
        let in_flight = InFlight::new();
        in_flight.finish();
        assert_eq!(in_flight.current(), 0);
    }
}
