//! # Artist Search
//!
//! - [`SearchSession`]: paged, generation-guarded artist search
//! - [`RecentQueries`]: bounded most-recent-first query history
//! - [`QueryDebouncer`] / [`DebouncedSearch`]: quiet-period input debouncing

pub mod debounce;
pub mod error;
pub mod recent;
pub mod session;

pub use debounce::{DebouncedSearch, QueryDebouncer, SearchUpdate, DEFAULT_DEBOUNCE};
pub use error::{Result, SearchError};
pub use recent::{RecentQueries, DEFAULT_RECENT_CAPACITY, RECENT_SEARCHES_SLOT};
pub use session::{ResultKind, SearchSession, DEFAULT_PAGE_LIMIT};
