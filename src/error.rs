//! Error types for the ColdFusion L1 driver.
//!
//! Nothing here is retried internally; every failure propagates to the
//! caller, which owns retry/backoff policy. Discovery in particular is
//! all-or-nothing: a partial topology is unsafe for path computations.

use thiserror::Error;

use crate::topology::PortKey;

pub type Result<T> = std::result::Result<T, DriverError>;

#[derive(Error, Debug)]
pub enum DriverError {
    /// Address or egress token parsing failure. Caller bug, never defaulted.
    #[error("malformed port address: {0}")]
    MalformedAddress(String),

    /// Attribute name the chassis API has no write path for.
    #[error("unsupported port attribute: {0}")]
    UnsupportedAttribute(String),

    /// An egress token referenced a port that should exist on a known
    /// linecard but doesn't. Fatal to the discovery call.
    #[error(
        "egress references missing port {expected} on linecard {linecard} (known ports: {known:?})"
    )]
    TopologyInconsistency {
        linecard: u32,
        expected: PortKey,
        known: Vec<PortKey>,
    },

    /// The chassis returned a structured `{"Error": ...}` body; the device's
    /// message is surfaced verbatim.
    #[error("chassis rejected request: {0}")]
    DeviceRejected(String),

    /// Non-2xx status with no structured error body.
    #[error("chassis returned HTTP {0}")]
    TransportStatus(u16),

    /// Connectivity or protocol-level failure below the API layer.
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    /// A response decoded as JSON but not into the expected shape.
    #[error("unexpected response shape: {0}")]
    Decode(#[from] serde_json::Error),
}
