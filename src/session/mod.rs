//! Per-device session: the login/version probe, the device-held
//! synchronization id, and port attribute access.
//!
//! A [`Session`] is an explicit value threaded through the caller's code;
//! there is no process-wide device state.

use serde_json::{json, Value};

use crate::address::PortAddress;
use crate::client::ChassisClient;
use crate::error::{DriverError, Result};

pub struct Session<C: ChassisClient> {
    client: C,
    address: String,
    version: String,
}

impl<C: ChassisClient> Session<C> {
    /// Log in to the device at `address`: one version read confirms
    /// connectivity and captures the reported firmware version.
    pub async fn login(client: C, address: &str) -> Result<Self> {
        let reply = client.get_json("/system/do/version").await?;
        let version = reply
            .get("Version")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        tracing::info!("login to {} succeeded, CF version {}", address, version);
        Ok(Self {
            client,
            address: address.to_string(),
            version,
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Firmware version captured at login
    pub fn version(&self) -> &str {
        &self.version
    }

    /// The underlying client, for discovery and connection operations
    /// sharing this session.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Read the device-held synchronization token. The caller stores and
    /// compares it to detect out-of-band topology changes.
    pub async fn state_id(&self) -> Result<String> {
        let summary = self.client.get_json("/chassis/").await?;
        Ok(match summary.get("SessionId") {
            Some(Value::String(id)) => id.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        })
    }

    pub async fn set_state_id(&self, state_id: &str) -> Result<()> {
        tracing::info!("set state id = {}", state_id);
        self.client
            .put_json("/chassis/", json!({ "SessionId": state_id }))
            .await?;
        Ok(())
    }

    /// Per-port attribute reads have no API surface yet.
    // TODO: wire this to the linecard port resource once the firmware
    // exposes per-port attribute reads
    pub async fn port_attribute(&self, _port: &str, _attribute: &str) -> Result<String> {
        Ok(String::new())
    }

    /// Write a port attribute. Only the speed attribute has a write path on
    /// the chassis API.
    pub async fn set_port_attribute(
        &self,
        port: &str,
        attribute: &str,
        value: &str,
    ) -> Result<()> {
        if !matches!(attribute, "Speed" | "Port Speed") {
            return Err(DriverError::UnsupportedAttribute(attribute.to_string()));
        }
        let addr = PortAddress::parse_external(port)?;
        let speed = match addr.lane() {
            Some(lane) => padded_lane_value(value, lane),
            None => value.to_string(),
        };
        tracing::info!("set {} speed = {:?}", addr.absolute_id(), speed);
        self.client
            .put_json(
                &format!(
                    "/chassis/linecards/{}/ports/{}",
                    addr.linecard(),
                    addr.port()
                ),
                json!({ "Speed": speed }),
            )
            .await?;
        Ok(())
    }
}

/// Per-lane attribute encoding: the value occupies its lane's slot in a
/// 4-slot comma-separated field (`lane-1` leading and `4-lane` trailing
/// separators). Not yet confirmed against real firmware.
fn padded_lane_value(value: &str, lane: u8) -> String {
    format!(
        "{}{}{}",
        ",".repeat(lane.saturating_sub(1) as usize),
        value,
        ",".repeat(4usize.saturating_sub(lane as usize))
    )
}
