//! Request validation and execution pipeline
//!
//! This module implements:
//! - Request and deployment types with canonical hashing
//! - The validate / execute gates, including reentrancy protection
//! - Deploy-time bootstrap validation
//! - Entry point selectors for self-directed calls

pub mod pipeline;
pub mod request;

pub use pipeline::{selectors, Validated};
pub use request::{
    is_supported_version, sign_request, Call, DeployRequest, InvokeRequest, DEFAULT_CHAIN_ID,
    ESTIMATE_FLAG, REQUEST_VERSION, SUPPORTED_VERSIONS,
};
