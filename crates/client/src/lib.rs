//! REST transport for the expense tracker.
//!
//! [`ApiClient`] wraps every endpoint of the server; [`EndpointSource`] plugs
//! a read endpoint into an `engine` data collection.

pub use api::ApiClient;
pub use endpoint::{Endpoint, EndpointSource, Listing};
pub use error::{ClientError, Result};

mod api;
mod endpoint;
mod error;
