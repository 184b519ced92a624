//! Map/unmap commands against resolved port addresses.
//!
//! Every operation is a single `POST /chassis/do/map` or `.../unmap` call;
//! partial application across a multi-pair request is a device property, not
//! something this layer controls.

use serde::Serialize;

use crate::address::PortAddress;
use crate::client::ChassisClient;
use crate::error::Result;

/// Connection direction as the map/unmap API spells it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Direction {
    TwoWay,
    OneWay,
    Undefined,
}

#[derive(Debug, Serialize)]
struct PortPair {
    /// `None` serializes as JSON null, which the unmap API reads as
    /// "whatever currently terminates at B"
    #[serde(rename = "A")]
    a: Option<String>,
    #[serde(rename = "B")]
    b: String,
}

#[derive(Debug, Serialize)]
struct MapRequest {
    #[serde(rename = "Direction")]
    direction: Direction,
    #[serde(rename = "Pairs")]
    pairs: Vec<PortPair>,
}

/// Issues cross-connect commands through a [`ChassisClient`]
pub struct ConnectionManager<'a, C: ChassisClient> {
    client: &'a C,
}

impl<'a, C: ChassisClient> ConnectionManager<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }

    /// Create a bidirectional connection between two ports.
    pub async fn map_bidi(&self, src_port: &str, dst_port: &str) -> Result<()> {
        tracing::info!("map bidi {} <-> {}", src_port, dst_port);
        let src = PortAddress::parse_external(src_port)?;
        let dst = PortAddress::parse_external(dst_port)?;
        self.post(
            "/chassis/do/map",
            MapRequest {
                direction: Direction::TwoWay,
                pairs: vec![PortPair {
                    a: Some(src.wire_id()),
                    b: dst.wire_id(),
                }],
            },
        )
        .await
    }

    /// Connect one source to one or more destinations, one way. Multicast
    /// fan-out goes in a single request.
    pub async fn map_uni(&self, src_port: &str, dst_ports: &[&str]) -> Result<()> {
        tracing::info!("map uni {} -> {:?}", src_port, dst_ports);
        let src = PortAddress::parse_external(src_port)?;
        let pairs = dst_ports
            .iter()
            .map(|dst| {
                Ok(PortPair {
                    a: Some(src.wire_id()),
                    b: PortAddress::parse_external(dst)?.wire_id(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        self.post(
            "/chassis/do/map",
            MapRequest {
                direction: Direction::OneWay,
                pairs,
            },
        )
        .await
    }

    /// Clear whatever connection terminates at each destination, regardless
    /// of its source or direction.
    pub async fn map_clear(&self, ports: &[&str]) -> Result<()> {
        tracing::info!("map clear {:?}", ports);
        let pairs = ports
            .iter()
            .map(|dst| {
                Ok(PortPair {
                    a: None,
                    b: PortAddress::parse_external(dst)?.wire_id(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        self.post(
            "/chassis/do/unmap",
            MapRequest {
                direction: Direction::Undefined,
                pairs,
            },
        )
        .await
    }

    /// Clear only the connections matching both the source and each
    /// destination.
    pub async fn map_clear_to(&self, src_port: &str, dst_ports: &[&str]) -> Result<()> {
        tracing::info!("map clear {} -> {:?}", src_port, dst_ports);
        let src = PortAddress::parse_external(src_port)?;
        let pairs = dst_ports
            .iter()
            .map(|dst| {
                Ok(PortPair {
                    a: Some(src.wire_id()),
                    b: PortAddress::parse_external(dst)?.wire_id(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        self.post(
            "/chassis/do/unmap",
            MapRequest {
                direction: Direction::OneWay,
                pairs,
            },
        )
        .await
    }

    /// Add a TAP (monitoring) connection. On a circuit switch this is just
    /// another one-way fan-out.
    pub async fn map_tap(&self, src_port: &str, dst_ports: &[&str]) -> Result<()> {
        tracing::info!("map tap {} -> {:?}", src_port, dst_ports);
        self.map_uni(src_port, dst_ports).await
    }

    async fn post(&self, path: &str, request: MapRequest) -> Result<()> {
        self.client
            .post_json(path, serde_json::to_value(&request)?)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::MockClient;
    use crate::error::DriverError;
    use serde_json::json;

    #[tokio::test]
    async fn bidi_issues_one_two_way_pair() {
        let mock = MockClient::new();
        mock.respond("POST", "/chassis/do/map", json!({}));

        ConnectionManager::new(&mock)
            .map_bidi("192.168.42.240/1/21", "192.168.42.240/1/22")
            .await
            .unwrap();

        let recorded = mock.recorded();
        assert_eq!(recorded.len(), 1);
        assert_eq!(
            recorded[0].body.as_ref().unwrap(),
            &json!({
                "Direction": "TwoWay",
                "Pairs": [{ "A": "1.21", "B": "1.22" }],
            })
        );
    }

    #[tokio::test]
    async fn uni_fans_out_in_one_request() {
        let mock = MockClient::new();
        mock.respond("POST", "/chassis/do/map", json!({}));

        ConnectionManager::new(&mock)
            .map_uni("cf/1/21_3", &["cf/1/22_3", "cf/2/1"])
            .await
            .unwrap();

        let recorded = mock.recorded();
        assert_eq!(recorded.len(), 1);
        assert_eq!(
            recorded[0].body.as_ref().unwrap(),
            &json!({
                "Direction": "OneWay",
                "Pairs": [
                    { "A": "1.21:3", "B": "1.22:3" },
                    { "A": "1.21:3", "B": "2.1" },
                ],
            })
        );
    }

    #[tokio::test]
    async fn clear_unmaps_with_null_source() {
        let mock = MockClient::new();
        mock.respond("POST", "/chassis/do/unmap", json!({}));

        ConnectionManager::new(&mock)
            .map_clear(&["cf/1/21", "cf/1/22"])
            .await
            .unwrap();

        let recorded = mock.recorded();
        assert_eq!(recorded[0].path, "/chassis/do/unmap");
        assert_eq!(
            recorded[0].body.as_ref().unwrap(),
            &json!({
                "Direction": "Undefined",
                "Pairs": [
                    { "A": null, "B": "1.21" },
                    { "A": null, "B": "1.22" },
                ],
            })
        );
    }

    #[tokio::test]
    async fn clear_to_unmaps_explicit_pairs() {
        let mock = MockClient::new();
        mock.respond("POST", "/chassis/do/unmap", json!({}));

        ConnectionManager::new(&mock)
            .map_clear_to("cf/1/21", &["cf/1/22"])
            .await
            .unwrap();

        assert_eq!(
            mock.recorded()[0].body.as_ref().unwrap(),
            &json!({
                "Direction": "OneWay",
                "Pairs": [{ "A": "1.21", "B": "1.22" }],
            })
        );
    }

    #[tokio::test]
    async fn tap_is_a_one_way_fan_out() {
        let mock = MockClient::new();
        mock.respond("POST", "/chassis/do/map", json!({}));
        mock.respond("POST", "/chassis/do/map", json!({}));

        let mgr = ConnectionManager::new(&mock);
        mgr.map_tap("cf/1/21", &["cf/1/22"]).await.unwrap();
        mgr.map_uni("cf/1/21", &["cf/1/22"]).await.unwrap();

        let recorded = mock.recorded();
        assert_eq!(recorded[0].body, recorded[1].body);
        assert_eq!(recorded[0].path, recorded[1].path);
    }

    #[tokio::test]
    async fn malformed_address_fails_before_any_request() {
        let mock = MockClient::new();
        let err = ConnectionManager::new(&mock)
            .map_bidi("not-an-address", "cf/1/22")
            .await
            .unwrap_err();
        assert!(matches!(err, DriverError::MalformedAddress(_)));
        assert!(mock.recorded().is_empty());
    }
}
