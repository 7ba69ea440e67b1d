//! Pagination Store subsystem
//!
//! Opaque, single-use, TTL-bound tokens that each stand for one
//! pre-compiled next-page statement.
//!
//! # Invariants
//!
//! - At most one context per live token
//! - After `rotate(ctx)` the old token resolves to nothing
//! - A token resolves before `created_at + ttl` and never at or after it

mod clock;
mod config;
mod context;
mod errors;
mod store;
mod sweeper;
mod token;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::PaginationConfig;
pub use context::{page_number, total_pages, PaginationContext};
pub use errors::{PaginationError, PaginationResult};
pub use store::PaginationStore;
pub use sweeper::{Sweeper, SweeperHandle};
pub use token::{fingerprint, generate_token};
