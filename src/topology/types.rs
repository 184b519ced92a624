use serde::Deserialize;
use serde_json::Value;

// --- Chassis API payloads ---

/// Port type that supports 4-way lane breakout
pub const BREAKOUT_PORT_TYPE: &str = "OPort_CF1";

/// `GET /chassis/` summary
#[derive(Debug, Deserialize)]
pub struct ChassisSummary {
    #[serde(rename = "SessionId", default)]
    pub session_id: Value,
    #[serde(rename = "Serial")]
    pub serial: String,
    /// One entry per slot; `null` marks an empty slot
    #[serde(rename = "Linecards")]
    pub linecards: Vec<Option<Value>>,
}

/// One entry of `GET /chassis/linecards/{slot}/ports`
#[derive(Debug, Deserialize)]
pub struct PortInfo {
    #[serde(rename = "Type")]
    pub port_type: String,
    #[serde(rename = "Breakout", default)]
    pub breakout: bool,
}

impl PortInfo {
    /// Breakout expansion applies only to the breakout-capable port type
    /// with its breakout flag set.
    pub fn is_breakout(&self) -> bool {
        self.breakout && self.port_type == BREAKOUT_PORT_TYPE
    }
}

/// `POST /chassis/do/show-flow` reply
#[derive(Debug, Deserialize)]
pub struct FlowReply {
    #[serde(rename = "Ports")]
    pub ports: Vec<PortFlow>,
}

/// Per-port egress snapshot. Each inner array is one destination, with one
/// slot per lane when the far end is lane-addressed, otherwise a single
/// slot broadcast to all lanes.
#[derive(Debug, Deserialize)]
pub struct PortFlow {
    #[serde(rename = "Egress", default)]
    pub egress: Vec<Vec<Option<String>>>,
}
