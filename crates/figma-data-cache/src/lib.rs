//! Figma Data Cache Library
//!
//! Keeps the latest copy of one upstream Figma API payload in memory and
//! serves it over HTTP.

pub mod cache;
pub mod config;
pub mod error;
pub mod refresher;
pub mod server;
pub mod types;

pub use cache::CacheCell;
pub use config::Config;
pub use error::{CacheError, Result};
pub use refresher::{
    FetchOutcome, FixedInterval, HttpUpstream, NonSuccessPolicy, RefreshSchedule, Refresher,
    UpstreamResponse, UpstreamSource,
};
pub use server::{create_router, serve, start_server, ServerState, SharedState};
pub use types::*;
