//! Mock radio transport for testing

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::core::error::{TransportError, TransportResult};
use crate::transport::RadioTransport;

#[derive(Debug, Default)]
struct MockState {
    frames: Vec<Vec<u8>>,
    fail_after: Option<usize>,
    attempts: usize,
}

/// Mock radio that records every frame sent through it
#[derive(Debug, Clone, Default)]
pub struct MockRadio {
    inner: Arc<Mutex<MockState>>,
}

impl MockRadio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every send attempt after the first `count` ones
    pub async fn fail_after(&self, count: usize) {
        self.inner.lock().await.fail_after = Some(count);
    }

    /// Frames delivered so far, as text
    pub async fn sent_frames(&self) -> Vec<String> {
        self.inner
            .lock()
            .await
            .frames
            .iter()
            .map(|f| String::from_utf8_lossy(f).into_owned())
            .collect()
    }

    /// Number of send calls, including failed ones
    pub async fn attempts(&self) -> usize {
        self.inner.lock().await.attempts
    }
}

impl RadioTransport for MockRadio {
    async fn send(&self, frame: &[u8]) -> TransportResult<()> {
        let mut state = self.inner.lock().await;
        state.attempts += 1;
        if state.fail_after.is_some_and(|limit| state.attempts > limit) {
            return Err(TransportError::NotifyFailed("Mock link down".into()));
        }
        state.frames.push(frame.to_vec());
        Ok(())
    }
}
