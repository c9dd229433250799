//! Filter-driven data synchronization for the expense tracker.
//!
//! The pieces, leaves first:
//!
//! - [`filter`]: the date-range selection and its pure resolution into
//!   `from`/`to` bounds.
//! - [`FilterState`]: the single shared selection, mutated by user action.
//! - [`DataCollectionStore`]: one fetched dataset with its load lifecycle and
//!   stale-response guard.
//! - [`FetchOrchestrator`]: refetches every registered store when the
//!   selection changes.
//!
//! Transport is abstracted behind [`Source`]; the `client` crate provides the
//! HTTP implementation.

pub use clock::{Clock, FixedClock, ZonedClock};
pub use error::{FetchError, FilterError};
pub use filter::{FilterLabel, FilterSelection, ResolvedRange, resolve};
pub use orchestrator::{DispatchReport, FetchOrchestrator, PipelineState, StoreReport, Trigger};
pub use state::FilterState;
pub use store::{
    DataCollection, DataCollectionStore, FetchOutcome, FetchStatus, Refetch, Source,
};

pub mod filter;

mod clock;
mod error;
mod orchestrator;
mod state;
mod store;
