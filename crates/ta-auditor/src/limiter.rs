//! Sliding-window request and token limiter

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use ta_tokens::{limits_for, ModelLimits};
use tokio::sync::Mutex;

const WINDOW: Duration = Duration::from_secs(60);
const MAX_SLEEP: Duration = Duration::from_secs(5);

/// Recent sends for one model: when, and how many tokens
#[derive(Debug, Default)]
struct Window {
    entries: VecDeque<(Instant, usize)>,
}

impl Window {
    fn prune(&mut self, now: Instant) {
        while let Some(&(at, _)) = self.entries.front() {
            if now.duration_since(at) >= WINDOW {
                self.entries.pop_front();
            } else {
                break;
            }
        }
    }

    fn tokens(&self) -> usize {
        self.entries.iter().map(|(_, t)| t).sum()
    }

    /// How long until a request of `tokens` fits, or None if it fits now
    fn delay(&self, limits: ModelLimits, tokens: usize, now: Instant) -> Option<Duration> {
        let over_rpm = self.entries.len() >= limits.rpm as usize;
        let over_tpm = self.tokens() + tokens > limits.tpm;
        if !over_rpm && !over_tpm {
            return None;
        }
        // An oversized request goes through once the window is empty
        let (oldest, _) = self.entries.front()?;
        let wait = WINDOW.saturating_sub(now.duration_since(*oldest));
        Some(wait.clamp(Duration::from_millis(10), MAX_SLEEP))
    }
}

/// Holds requests until they fit a model's per-minute budget.
#[derive(Debug, Default)]
pub struct RateLimiter {
    windows: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until `tokens` more can be sent to `model`, then record them
    pub async fn acquire(&self, model: &str, tokens: usize) {
        let limits = limits_for(model);
        if tokens > limits.tpm {
            tracing::warn!(
                model,
                tokens,
                tpm = limits.tpm,
                "Request exceeds the model's tokens-per-minute limit"
            );
        }

        loop {
            let wait = {
                let mut windows = self.windows.lock().await;
                let window = windows.entry(model.to_string()).or_default();
                let now = Instant::now();
                window.prune(now);
                match window.delay(limits, tokens, now) {
                    None => {
                        window.entries.push_back((now, tokens));
                        return;
                    }
                    Some(wait) => wait,
                }
            };
            tracing::debug!(model, wait_ms = wait.as_millis() as u64, "Rate limit reached, waiting");
            tokio::time::sleep(wait).await;
        }
    }

    /// Requests and tokens recorded for `model` in the current window
    pub async fn usage(&self, model: &str) -> (usize, usize) {
        let mut windows = self.windows.lock().await;
        match windows.get_mut(model) {
            Some(window) => {
                window.prune(Instant::now());
                (window.entries.len(), window.tokens())
            }
            None => (0, 0),
        }
    }
}
