//! # Query Debouncer
//!
//! Text input goes into a channel; a background task waits for a quiet period
//! after the latest input and then emits that value, but only when it differs
//! from the value it emitted before.
//!
//! [`DebouncedSearch`] wires a debouncer to a [`SearchSession`]: every emitted
//! query starts a search, and a newer query supersedes one still in flight.

use crate::error::{Result, SearchError};
use crate::session::SearchSession;
use core_async::task::JoinHandle;
use core_async::time::{sleep_until, Duration, Instant};
use core_metadata::{ApiError, Artist};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(400);

/// Timer-debounced channel of query strings.
pub struct QueryDebouncer {
    input: mpsc::UnboundedSender<String>,
    task: JoinHandle<()>,
}

impl QueryDebouncer {
    /// Spawn the debounce task. Must be called within a Tokio runtime.
    pub fn spawn(quiet: Duration) -> (Self, mpsc::UnboundedReceiver<String>) {
        let (input, input_rx) = mpsc::unbounded_channel();
        let (output, output_rx) = mpsc::unbounded_channel();

        let task = core_async::task::spawn(debounce(quiet, input_rx, output));
        (Self { input, task }, output_rx)
    }

    /// Feed the latest input text; restarts the quiet timer.
    pub fn push(&self, text: impl Into<String>) -> Result<()> {
        self.input.send(text.into()).map_err(|_| SearchError::Closed)
    }
}

impl Drop for QueryDebouncer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn debounce(
    quiet: Duration,
    mut input: mpsc::UnboundedReceiver<String>,
    output: mpsc::UnboundedSender<String>,
) {
    let mut pending: Option<String> = None;
    let mut last_emitted: Option<String> = None;
    let mut deadline = Instant::now();

    loop {
        tokio::select! {
            received = input.recv() => match received {
                Some(text) => {
                    pending = Some(text);
                    deadline = Instant::now() + quiet;
                }
                None => break,
            },
            _ = sleep_until(deadline), if pending.is_some() => {
                let Some(text) = pending.take() else { continue };
                if last_emitted.as_deref() == Some(text.as_str()) {
                    debug!("Debounced query unchanged, not emitting");
                    continue;
                }
                if output.send(text.clone()).is_err() {
                    break;
                }
                last_emitted = Some(text);
            }
        }
    }
}

/// Outcome of a debounced search.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchUpdate {
    Results { query: String, artists: Vec<Artist> },
    Failed { query: String, error: ApiError },
}

/// A [`SearchSession`] driven by debounced text input.
pub struct DebouncedSearch {
    debouncer: QueryDebouncer,
    driver: JoinHandle<()>,
}

impl DebouncedSearch {
    /// Start debouncing input into `session`. Superseded searches produce no
    /// update.
    pub fn spawn(
        session: Arc<SearchSession>,
        quiet: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<SearchUpdate>) {
        let (debouncer, mut queries) = QueryDebouncer::spawn(quiet);
        let (updates, updates_rx) = mpsc::unbounded_channel();

        let driver = core_async::task::spawn(async move {
            while let Some(query) = queries.recv().await {
                let session = Arc::clone(&session);
                let updates = updates.clone();
                core_async::task::spawn(async move {
                    let update = match session.search(&query).await {
                        Ok(artists) => SearchUpdate::Results { query, artists },
                        Err(SearchError::Api(error)) => SearchUpdate::Failed { query, error },
                        Err(e) => {
                            debug!(error = %e, "Dropping search outcome");
                            return;
                        }
                    };
                    let _ = updates.send(update);
                });
            }
        });

        (Self { debouncer, driver }, updates_rx)
    }

    pub fn input(&self, text: impl Into<String>) -> Result<()> {
        self.debouncer.push(text)
    }
}

impl Drop for DebouncedSearch {
    fn drop(&mut self) {
        self.driver.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_emits_latest_value_after_quiet_period() {
        let (debouncer, mut out) = QueryDebouncer::spawn(DEFAULT_DEBOUNCE);

        debouncer.push("r").unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        debouncer.push("ra").unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        debouncer.push("rad").unwrap();

        tokio::time::sleep(Duration::from_millis(399)).await;
        assert!(out.try_recv().is_err());

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(out.recv().await.as_deref(), Some("rad"));
        assert!(out.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unchanged_value_is_not_emitted_twice() {
        let (debouncer, mut out) = QueryDebouncer::spawn(DEFAULT_DEBOUNCE);

        debouncer.push("abc").unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(out.recv().await.as_deref(), Some("abc"));

        debouncer.push("abcd").unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        debouncer.push("abc").unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(out.try_recv().is_err());

        debouncer.push("").unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(out.recv().await.as_deref(), Some(""));
    }
}
