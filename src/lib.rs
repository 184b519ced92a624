//! Driver for ColdFusion L1 optical circuit switch chassis.
//!
//! Discovers the physical topology (linecards, ports, breakout lanes, and
//! the cross-connects between them) over the chassis HTTPS management API,
//! and issues point-to-point / point-to-multipoint map commands.
//!
//! The transport is the narrow [`ChassisClient`] trait; everything else is
//! address translation and graph construction. A typical flow:
//!
//! ```no_run
//! # async fn run() -> coldfusion_l1::Result<()> {
//! use coldfusion_l1::{Config, ConnectionManager, HttpChassisClient, Session, TopologyBuilder};
//!
//! let config = Config::load();
//! let client = HttpChassisClient::connect("192.168.42.240", "admin", "admin", &config)?;
//! let session = Session::login(client, "192.168.42.240").await?;
//!
//! let chassis = TopologyBuilder::new(session.client())
//!     .discover(session.address())
//!     .await?;
//! println!("chassis {} has {} linecards", chassis.serial, chassis.linecards.len());
//!
//! ConnectionManager::new(session.client())
//!     .map_bidi("192.168.42.240/1/21", "192.168.42.240/1/22")
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod address;
pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod session;
pub mod topology;

pub use address::{EgressToken, PortAddress};
pub use client::{ChassisClient, HttpChassisClient};
pub use config::Config;
pub use connection::{ConnectionManager, Direction};
pub use error::{DriverError, Result};
pub use session::Session;
pub use topology::{Chassis, Linecard, Port, PortKey, PortLocation, TopologyBuilder};
