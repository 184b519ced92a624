//! In-memory chassis topology and the discovery pass that builds it.
//!
//! Discovery is two-phase: first every port on every installed linecard is
//! created, then the per-linecard egress snapshots are resolved into mapping
//! edges by key lookup. Egress tokens routinely reference ports on other
//! linecards, so the full port index must exist before any edge is resolved.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::json;

use crate::address::{compact_port, EgressToken};
use crate::client::ChassisClient;
use crate::error::{DriverError, Result};

mod types;

pub use types::{ChassisSummary, FlowReply, PortFlow, PortInfo, BREAKOUT_PORT_TYPE};

pub const CHASSIS_MODEL: &str = "Coldfusion Chassis";
pub const LINECARD_MODEL: &str = "Generic L1 Module";
pub const PORT_MODEL: &str = "Generic L1 Port";

/// Identity of a port within its linecard. `lane: None` is an ordinary
/// single-lane port; `Some(1..=4)` is one lane of a breakout port.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PortKey {
    pub port: u32,
    pub lane: Option<u8>,
}

impl PortKey {
    pub fn plain(port: u32) -> Self {
        Self { port, lane: None }
    }

    pub fn laned(port: u32, lane: u8) -> Self {
        Self { port, lane: Some(lane) }
    }

    /// Compact port code, unique within a linecard
    pub fn compact_id(&self) -> String {
        compact_port(self.port, self.lane)
    }
}

impl fmt::Display for PortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.compact_id())
    }
}

impl fmt::Debug for PortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.compact_id())
    }
}

/// Chassis-wide position of a port, resolvable by lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortLocation {
    pub linecard: u32,
    pub key: PortKey,
}

/// One physical port or breakout lane
#[derive(Debug, Clone)]
pub struct Port {
    /// Compact port code (`"21"`, `"21_3"`)
    pub id: String,
    pub model_name: String,
    /// Label encoding `linecard.port.lane`
    pub serial: String,
    /// Sources currently cross-connected into this port. More than one
    /// entry only occurs for multicast/TAP fan-in targets.
    pub mapped_from: Vec<PortLocation>,
}

/// A slot-installed linecard and its ports
#[derive(Debug, Clone)]
pub struct Linecard {
    /// 1-based slot number
    pub number: u32,
    pub model_name: String,
    /// Placeholder label; the chassis does not report per-card serials
    pub serial: String,
    pub ports: BTreeMap<PortKey, Port>,
}

/// Snapshot of one chassis, rebuilt from scratch on every discovery
#[derive(Debug, Clone)]
pub struct Chassis {
    /// Resource id: the device address the snapshot was taken from
    pub address: String,
    pub model_name: String,
    pub serial: String,
    pub linecards: BTreeMap<u32, Linecard>,
}

impl Chassis {
    pub fn port(&self, location: &PortLocation) -> Option<&Port> {
        self.linecards
            .get(&location.linecard)
            .and_then(|lc| lc.ports.get(&location.key))
    }
}

/// Destination-lane inference for breakout peers.
///
/// The firmware lane-qualifies an egress entry only when the far end is
/// itself lane-addressed; a single-element entry is broadcast to all lanes
/// and the peer lane is taken to equal the source lane. Observed device
/// convention, reproduced as-is.
fn infer_peer_lane(token_lane: Option<u8>, entry_len: usize, source_lane: u8) -> Option<u8> {
    if entry_len == 1 {
        Some(source_lane)
    } else {
        token_lane
    }
}

/// Builds a [`Chassis`] snapshot from the device's management API
pub struct TopologyBuilder<'a, C: ChassisClient> {
    client: &'a C,
}

impl<'a, C: ChassisClient> TopologyBuilder<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }

    /// Discover the full topology of the chassis at `chassis_address`.
    ///
    /// All-or-nothing: any inconsistency aborts the snapshot rather than
    /// returning a partial graph.
    pub async fn discover(&self, chassis_address: &str) -> Result<Chassis> {
        let summary: ChassisSummary =
            serde_json::from_value(self.client.get_json("/chassis/").await?)?;

        let mut chassis = Chassis {
            address: chassis_address.to_string(),
            model_name: CHASSIS_MODEL.to_string(),
            serial: summary.serial,
            linecards: BTreeMap::new(),
        };

        // Pass 1: create every port on every installed linecard. Slot
        // indices are 0-based in API paths, 1-based everywhere else.
        let mut port_meta: BTreeMap<u32, Vec<PortInfo>> = BTreeMap::new();
        for (slot, entry) in summary.linecards.iter().enumerate() {
            if entry.is_none() {
                continue;
            }
            let number = slot as u32 + 1;
            tracing::info!("discovering linecard {}", number);

            let infos: Vec<PortInfo> = serde_json::from_value(
                self.client
                    .get_json(&format!("/chassis/linecards/{}/ports", slot))
                    .await?,
            )?;

            let mut linecard = Linecard {
                number,
                model_name: LINECARD_MODEL.to_string(),
                serial: format!("L{}", number),
                ports: BTreeMap::new(),
            };
            for (i, info) in infos.iter().enumerate() {
                let port = i as u32 + 1;
                if info.is_breakout() {
                    for lane in 1..=4u8 {
                        linecard.add_port(number, PortKey::laned(port, lane));
                    }
                } else {
                    linecard.add_port(number, PortKey::plain(port));
                }
            }
            chassis.linecards.insert(number, linecard);
            port_meta.insert(number, infos);
        }

        // Pass 2: one batched show-flow per linecard, then resolve each
        // port's egress list into edges on the destination side.
        for (&number, infos) in &port_meta {
            let wire_ids: Vec<String> = (1..=infos.len() as u32)
                .map(|p| format!("{}.{}", number, p))
                .collect();
            let reply: FlowReply = serde_json::from_value(
                self.client
                    .post_json("/chassis/do/show-flow", json!({ "Ports": wire_ids }))
                    .await?,
            )?;

            for (i, (info, flow)) in infos.iter().zip(reply.ports.iter()).enumerate() {
                let port = i as u32 + 1;
                if info.is_breakout() {
                    self.resolve_breakout_egress(&mut chassis, number, port, flow)?;
                } else {
                    self.resolve_plain_egress(&mut chassis, number, port, flow)?;
                }
            }
        }

        Ok(chassis)
    }

    fn resolve_breakout_egress(
        &self,
        chassis: &mut Chassis,
        linecard: u32,
        port: u32,
        flow: &PortFlow,
    ) -> Result<()> {
        for lane in 1..=4u8 {
            let source = PortLocation {
                linecard,
                key: PortKey::laned(port, lane),
            };
            for entry in &flow.egress {
                if entry.is_empty() {
                    continue;
                }
                let index = (lane as usize - 1).min(entry.len() - 1);
                let token = match entry[index].as_deref() {
                    Some(token) if !token.is_empty() => token,
                    _ => continue,
                };
                let parsed = EgressToken::parse(token)?;
                let peer_lane = infer_peer_lane(parsed.lane, entry.len(), lane);

                // Cross-lane static mappings are not exposed at this layer;
                // only same-lane peers are recorded.
                if peer_lane != Some(lane) {
                    continue;
                }
                if !chassis.linecards.contains_key(&parsed.linecard) {
                    continue;
                }
                let dest = PortLocation {
                    linecard: parsed.linecard,
                    key: PortKey::laned(parsed.port, lane),
                };
                record_mapping(chassis, dest, source)?;
            }
        }
        Ok(())
    }

    fn resolve_plain_egress(
        &self,
        chassis: &mut Chassis,
        linecard: u32,
        port: u32,
        flow: &PortFlow,
    ) -> Result<()> {
        let source = PortLocation {
            linecard,
            key: PortKey::plain(port),
        };
        for entry in &flow.egress {
            let token = match entry.first().and_then(|slot| slot.as_deref()) {
                Some(token) if !token.is_empty() => token,
                _ => continue,
            };
            let parsed = EgressToken::parse(token)?;
            if !chassis.linecards.contains_key(&parsed.linecard) {
                continue;
            }
            let dest = PortLocation {
                linecard: parsed.linecard,
                key: PortKey {
                    port: parsed.port,
                    lane: parsed.lane,
                },
            };
            record_mapping(chassis, dest, source)?;
        }
        Ok(())
    }
}

impl Linecard {
    fn add_port(&mut self, number: u32, key: PortKey) {
        self.ports.insert(
            key,
            Port {
                id: key.compact_id(),
                model_name: PORT_MODEL.to_string(),
                serial: format!("{:02}.{}.{}", number, key.port, key.lane.unwrap_or(1)),
                mapped_from: Vec::new(),
            },
        );
    }
}

/// Store the edge on the destination port. The destination linecard has
/// already been checked; a missing port key there means the device reported
/// an egress the discovered topology cannot account for.
fn record_mapping(chassis: &mut Chassis, dest: PortLocation, source: PortLocation) -> Result<()> {
    let linecard = chassis
        .linecards
        .get_mut(&dest.linecard)
        .expect("destination linecard checked by caller");
    match linecard.ports.get_mut(&dest.key) {
        Some(port) => {
            tracing::debug!(
                "mapping {}.{} -> {}.{}",
                source.linecard,
                source.key,
                dest.linecard,
                dest.key
            );
            port.mapped_from.push(source);
            Ok(())
        }
        None => Err(DriverError::TopologyInconsistency {
            linecard: dest.linecard,
            expected: dest.key,
            known: linecard.ports.keys().copied().collect(),
        }),
    }
}
