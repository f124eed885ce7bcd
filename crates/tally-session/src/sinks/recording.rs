use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::SinkError;
use crate::sink::{Settlement, SettlementSink};

/// In-memory sink that records every accepted settlement.
///
/// Failures can be scripted: each queued reason makes one future submit
/// fail with [`SinkError::Rejected`], in order.
#[derive(Default)]
pub struct RecordingSink {
    inner: Mutex<RecordingState>,
    delay: Option<Duration>,
}

#[derive(Default)]
struct RecordingState {
    accepted: Vec<Settlement>,
    failures: VecDeque<String>,
    calls: usize,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose next `reasons.len()` submits fail.
    pub fn failing_with<I, S>(reasons: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let sink = Self::default();
        if let Ok(mut state) = sink.inner.lock() {
            state.failures = reasons.into_iter().map(Into::into).collect();
        }
        sink
    }

    /// Wait this long before answering each submit.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Settlements accepted so far, in submission order.
    pub fn settlements(&self) -> Vec<Settlement> {
        self.inner
            .lock()
            .map(|state| state.accepted.clone())
            .unwrap_or_default()
    }

    /// Number of submit calls received, successful or not.
    pub fn calls(&self) -> usize {
        self.inner.lock().map(|state| state.calls).unwrap_or_default()
    }
}

#[async_trait]
impl SettlementSink for RecordingSink {
    async fn submit(&self, settlement: &Settlement) -> Result<(), SinkError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let mut state = self
            .inner
            .lock()
            .map_err(|_| SinkError::Unavailable("recording sink lock poisoned".into()))?;
        state.calls += 1;
        if let Some(reason) = state.failures.pop_front() {
            return Err(SinkError::Rejected(reason));
        }
        state.accepted.push(settlement.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::tests::sample_settlement;

    #[tokio::test]
    async fn records_accepted_settlements() {
        let sink = RecordingSink::new();
        let settlement = sample_settlement();
        sink.submit(&settlement).await.unwrap();
        assert_eq!(sink.settlements(), vec![settlement]);
        assert_eq!(sink.calls(), 1);
    }

    #[tokio::test]
    async fn scripted_failures_run_in_order() {
        let sink = RecordingSink::failing_with(["gateway timeout", "declined"]);
        let settlement = sample_settlement();

        let err = sink.submit(&settlement).await.unwrap_err();
        assert!(matches!(err, SinkError::Rejected(ref r) if r == "gateway timeout"));
        let err = sink.submit(&settlement).await.unwrap_err();
        assert!(matches!(err, SinkError::Rejected(ref r) if r == "declined"));

        sink.submit(&settlement).await.unwrap();
        assert_eq!(sink.calls(), 3);
        assert_eq!(sink.settlements().len(), 1);
    }
}
