use std::sync::Mutex;

use super::Notifier;
use crate::error::NotifyError;

/// How a `MemoryNotifier` should answer `send`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailMode {
    Never,
    Always(u16),
    /// Fail only messages containing this marker text.
    Matching(&'static str, u16),
}

/// Keeps delivered messages in memory. Useful for tests and local tools.
pub struct MemoryNotifier {
    pub sent: Mutex<Vec<String>>,
    fail: FailMode,
}

impl Default for MemoryNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::with_fail_mode(FailMode::Never)
    }

    pub fn with_fail_mode(fail: FailMode) -> Self {
        Self {
            sent: Mutex::new(vec![]),
            fail,
        }
    }

    pub fn messages(&self) -> Vec<String> {
        self.sent.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

fn status_error(code: u16) -> NotifyError {
    match code {
        401 => NotifyError::Unauthorized,
        403 => NotifyError::Forbidden,
        404 => NotifyError::UnknownChannel,
        429 => NotifyError::RateLimited { retry_after_ms: 0 },
        c => NotifyError::Http(c),
    }
}

#[async_trait::async_trait]
impl Notifier for MemoryNotifier {
    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        match self.fail {
            FailMode::Always(code) => return Err(status_error(code)),
            FailMode::Matching(marker, code) if text.contains(marker) => {
                return Err(status_error(code))
            }
            _ => {}
        }
        if let Ok(mut v) = self.sent.lock() {
            v.push(text.to_string());
        }
        Ok(())
    }
}
