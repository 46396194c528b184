//! # Event Bus System
//!
//! Typed, in-process broadcast of core events using `tokio::sync::broadcast`.
//!
//! The library store publishes an event after every committed mutation and the
//! search session publishes its progress. Consumers subscribe independently;
//! a slow subscriber lags without blocking the publisher or anyone else.
//!
//! ```text
//! ┌───────────────┐  emit   ┌──────────┐  subscribe  ┌──────────────────────┐
//! │ Library store ├────────>│          ├────────────>│ LibrarySyncService   │
//! └───────────────┘         │ EventBus │             └──────────────────────┘
//! ┌───────────────┐  emit   │          │  subscribe  ┌──────────────────────┐
//! │ SearchSession ├────────>│          ├────────────>│ host / diagnostics   │
//! └───────────────┘         └──────────┘             └──────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, EventBus, LibraryEvent};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let bus = EventBus::new(16);
//! let mut subscriber = bus.subscribe();
//!
//! bus.emit(CoreEvent::Library(LibraryEvent::AlbumRemoved {
//!     album_id: "OK ComputerRadiohead".to_string(),
//! }))
//! .ok();
//!
//! let event = subscriber.recv().await.unwrap();
//! assert_eq!(event.description(), "Album removed from library");
//! # }
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: the subscriber missed `n` events. Non-fatal;
//!   consumers that only need "something changed" should treat it as a change.
//! - **`RecvError::Closed`**: every sender was dropped, i.e. shutdown.
//!
//! `emit` fails only when nobody is subscribed, which publishers ignore.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event published on the bus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Persisted library changes
    Library(LibraryEvent),
    /// Search session progress
    Search(SearchEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Library(e) => e.description(),
            CoreEvent::Search(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Search(SearchEvent::Failed { .. }) => EventSeverity::Warning,
            CoreEvent::Library(_) => EventSeverity::Info,
            CoreEvent::Search(SearchEvent::ResultSelected { .. }) => EventSeverity::Info,
            CoreEvent::Search(SearchEvent::PageLoaded { .. }) => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

// ============================================================================
// Library Events
// ============================================================================

/// Emitted by the library store after a mutation has been committed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum LibraryEvent {
    /// An album and its tracks were inserted.
    AlbumSaved {
        /// Album key (name followed by artist)
        album_id: String,
        name: String,
        artist: String,
    },
    /// An album and its tracks were deleted.
    AlbumRemoved { album_id: String },
}

impl LibraryEvent {
    fn description(&self) -> &str {
        match self {
            LibraryEvent::AlbumSaved { .. } => "Album saved to library",
            LibraryEvent::AlbumRemoved { .. } => "Album removed from library",
        }
    }

    /// Key of the album the event refers to.
    pub fn album_id(&self) -> &str {
        match self {
            LibraryEvent::AlbumSaved { album_id, .. } | LibraryEvent::AlbumRemoved { album_id } => {
                album_id
            }
        }
    }
}

// ============================================================================
// Search Events
// ============================================================================

/// Progress of the artist search session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum SearchEvent {
    /// A page was fetched and applied to the current session.
    PageLoaded {
        query: String,
        /// Session generation the page belongs to
        generation: u64,
        page: u32,
        /// Number of accumulated results after the page was appended
        accumulated: usize,
        /// Server-reported total
        total: u64,
    },
    /// A page fetch for the current session failed.
    Failed {
        query: String,
        page: u32,
        message: String,
    },
    /// The user picked a result; the query was promoted in recent searches.
    ResultSelected { query: String, artist: String },
}

impl SearchEvent {
    fn description(&self) -> &str {
        match self {
            SearchEvent::PageLoaded { .. } => "Search page loaded",
            SearchEvent::Failed { .. } => "Search page failed",
            SearchEvent::ResultSelected { .. } => "Search result selected",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central broadcast channel for [`CoreEvent`]s.
///
/// Cheap to clone; clones share the same channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus.
    ///
    /// `capacity` is the number of events buffered per subscriber before it
    /// starts receiving `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an error
    /// if there are no active subscribers.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A `broadcast::Receiver` that skips events not matching a filter.
///
/// ```rust
/// use core_runtime::events::{CoreEvent, EventBus, EventStream};
///
/// let bus = EventBus::new(16);
/// let library_only = EventStream::new(bus.subscribe())
///     .filter(|event| matches!(event, CoreEvent::Library(_)));
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only events that match `predicate` will be returned by `recv()`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn accepts(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Receives the next event that passes the filter.
    ///
    /// # Errors
    ///
    /// `RecvError::Lagged(n)` if the subscriber fell behind by `n` events,
    /// `RecvError::Closed` once all senders are gone.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive a matching event without waiting.
    ///
    /// Returns `None` if no matching events are currently buffered.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if self.accepts(&event) => return Some(Ok(event)),
                Ok(_) => continue,
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn saved(id: &str) -> CoreEvent {
        CoreEvent::Library(LibraryEvent::AlbumSaved {
            album_id: id.to_string(),
            name: "Blue".to_string(),
            artist: "Weezer".to_string(),
        })
    }

    fn selected(query: &str) -> CoreEvent {
        CoreEvent::Search(SearchEvent::ResultSelected {
            query: query.to_string(),
            artist: "Weezer".to_string(),
        })
    }

    #[tokio::test]
    async fn test_event_bus_subscription() {
        let bus = EventBus::new(10);
        assert_eq!(bus.subscriber_count(), 0);

        let _sub1 = bus.subscribe();
        let _sub2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);
    }

    #[tokio::test]
    async fn test_event_emission_no_subscribers() {
        let bus = EventBus::new(10);
        assert!(bus.emit(saved("BlueWeezer")).is_err());
    }

    #[tokio::test]
    async fn test_multiple_subscribers_receive_same_event() {
        let bus = EventBus::new(10);
        let mut sub1 = bus.subscribe();
        let mut sub2 = bus.subscribe();

        let event = saved("BlueWeezer");
        assert_eq!(bus.emit(event.clone()).unwrap(), 2);

        assert_eq!(sub1.recv().await.unwrap(), event);
        assert_eq!(sub2.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn test_event_stream_with_filter() {
        let bus = EventBus::new(10);
        let mut stream = EventStream::new(bus.subscribe())
            .filter(|event| matches!(event, CoreEvent::Library(_)));

        bus.emit(selected("weezer")).ok();
        let library_event = saved("BlueWeezer");
        bus.emit(library_event.clone()).ok();

        assert_eq!(stream.recv().await.unwrap(), library_event);
        assert!(stream.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_lagged_subscriber() {
        let bus = EventBus::new(2);
        let mut sub = bus.subscribe();

        for i in 0..5 {
            bus.emit(saved(&format!("album-{}", i))).ok();
        }

        assert!(matches!(sub.recv().await, Err(RecvError::Lagged(_))));
        // The subscriber keeps working after a lag
        assert!(sub.recv().await.is_ok());
    }

    #[test]
    fn test_event_severity_and_description() {
        let failed = CoreEvent::Search(SearchEvent::Failed {
            query: "muse".to_string(),
            page: 2,
            message: "offline".to_string(),
        });
        assert_eq!(failed.severity(), EventSeverity::Warning);
        assert_eq!(saved("x").severity(), EventSeverity::Info);
        assert_eq!(saved("x").description(), "Album saved to library");
        assert_eq!(selected("muse").description(), "Search result selected");
    }

    #[test]
    fn test_library_event_album_id() {
        let removed = LibraryEvent::AlbumRemoved {
            album_id: "BlueWeezer".to_string(),
        };
        assert_eq!(removed.album_id(), "BlueWeezer");
    }

    #[test]
    fn test_event_serialization() {
        let event = CoreEvent::Search(SearchEvent::PageLoaded {
            query: "radiohead".to_string(),
            generation: 3,
            page: 2,
            accumulated: 100,
            total: 240,
        });

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"Search\""));
        assert!(json.contains("\"event\":\"PageLoaded\""));

        let deserialized: CoreEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, event);
    }
}
