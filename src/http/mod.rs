//! HTTP API module for Argus
//!
//! Provides REST endpoints for:
//! - Batch scoring of synthetic dashboard metrics
//! - Live scoring of single observations

pub mod server;

pub use server::{
    create_server, start_server, AppState, ErrorResponse, LiveRequest, LiveResponse,
    SuccessResponse, LIVE_STREAM,
};
