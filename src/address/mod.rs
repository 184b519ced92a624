//! Conversions between the three port addressing schemes the chassis uses:
//! external addresses (`"192.168.42.240/1/21_3"`), compact lane-tagged port
//! codes (`"21_3"`), and device-reported egress tokens (`"1.21:3"`).
//!
//! Everything here is pure; malformed input is always a
//! [`DriverError::MalformedAddress`], never a silent default.

use crate::error::{DriverError, Result};

/// A fully qualified port address on one chassis.
///
/// A `Laned` address names one lane of a 4-way breakout port; `Plain`
/// addresses cover ordinary single-lane ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortAddress {
    Plain { linecard: u32, port: u32 },
    Laned { linecard: u32, port: u32, lane: u8 },
}

impl PortAddress {
    /// Parse an external port address: `"<device>/<linecard>/<port>[_<lane>]"`.
    pub fn parse_external(address: &str) -> Result<Self> {
        let parts: Vec<&str> = address.split('/').collect();
        if parts.len() != 3 {
            return Err(DriverError::MalformedAddress(format!(
                "expected <device>/<linecard>/<port>, got {:?}",
                address
            )));
        }
        let linecard = parse_num(parts[1], address)?;
        match parts[2].split_once('_') {
            Some((port, lane)) => Ok(Self::Laned {
                linecard,
                port: parse_num(port, address)?,
                lane: parse_num(lane, address)?,
            }),
            None => Ok(Self::Plain {
                linecard,
                port: parse_num(parts[2], address)?,
            }),
        }
    }

    /// The id the map/unmap API expects: `"{lc}.{port}"` or `"{lc}.{port}:{lane}"`.
    pub fn wire_id(&self) -> String {
        match *self {
            Self::Plain { linecard, port } => format!("{}.{}", linecard, port),
            Self::Laned {
                linecard,
                port,
                lane,
            } => format!("{}.{}:{}", linecard, port, lane),
        }
    }

    /// Compact port code, unique within a linecard: `"{port:02}[_{lane}]"`.
    pub fn compact_id(&self) -> String {
        compact_port(self.port(), self.lane())
    }

    /// Chassis-wide port code: `"{lc}.{port:02}[_{lane}]"`.
    pub fn absolute_id(&self) -> String {
        match *self {
            Self::Plain { linecard, port } => format!("{}.{:02}", linecard, port),
            Self::Laned {
                linecard,
                port,
                lane,
            } => format!("{}.{:02}_{}", linecard, port, lane),
        }
    }

    pub fn linecard(&self) -> u32 {
        match *self {
            Self::Plain { linecard, .. } | Self::Laned { linecard, .. } => linecard,
        }
    }

    pub fn port(&self) -> u32 {
        match *self {
            Self::Plain { port, .. } | Self::Laned { port, .. } => port,
        }
    }

    pub fn lane(&self) -> Option<u8> {
        match *self {
            Self::Plain { .. } => None,
            Self::Laned { lane, .. } => Some(lane),
        }
    }
}

/// Compact port code: `"{port:02}"`, or `"{port:02}_{lane}"` for a lane of a
/// breakout port.
pub fn compact_port(port: u32, lane: Option<u8>) -> String {
    match lane {
        Some(lane) => format!("{:02}_{}", port, lane),
        None => format!("{:02}", port),
    }
}

/// One parsed egress token as reported by show-flow: `"<lc>.<port>[:<lane>]"`.
///
/// A token without an explicit `:lane` (the far end is not lane-addressed, or
/// the firmware chose not to say) parses with `lane: None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EgressToken {
    pub linecard: u32,
    pub port: u32,
    pub lane: Option<u8>,
}

impl EgressToken {
    pub fn parse(token: &str) -> Result<Self> {
        let (lc, port_lane) = token.split_once('.').ok_or_else(|| {
            DriverError::MalformedAddress(format!(
                "expected <linecard>.<port>[:<lane>], got {:?}",
                token
            ))
        })?;
        let linecard = parse_num(lc, token)?;
        match port_lane.split_once(':') {
            Some((port, lane)) => Ok(Self {
                linecard,
                port: parse_num(port, token)?,
                lane: Some(parse_num(lane, token)?),
            }),
            None => Ok(Self {
                linecard,
                port: parse_num(port_lane, token)?,
                lane: None,
            }),
        }
    }
}

fn parse_num<T: std::str::FromStr>(field: &str, whole: &str) -> Result<T> {
    field.parse().map_err(|_| {
        DriverError::MalformedAddress(format!(
            "non-numeric field {:?} in {:?}",
            field, whole
        ))
    })
}
