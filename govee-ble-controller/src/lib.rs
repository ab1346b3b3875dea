//! Govee BLE Controller
//!
//! Session manager for Govee H613B Bluetooth LE bulbs: keeps a link to one
//! bulb, frames outbound commands, and keeps a local state snapshot in sync
//! with the state reports the bulb sends back.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use govee_ble_controller::{btle, SessionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let light = btle::open(None, Duration::from_secs(5), SessionConfig::default()).await?;
//!     light.register_callback(|state| println!("{state:?}"));
//!
//!     light.turn_on().await?;
//!     light.set_color(255, 0, 0).await?;
//!     light.update().await?;
//!
//!     light.disconnect().await?;
//!     Ok(())
//! }
//! ```

use uuid::Uuid;

pub mod btle;
pub mod callbacks;
pub mod config;
pub mod connection;
mod error;
pub mod pipeline;
pub mod session;
pub mod transport;

pub use callbacks::CallbackId;
pub use config::SessionConfig;
pub use connection::ConnectionState;
pub use error::{Error, Result};
pub use session::GoveeInstance;
pub use transport::{DisconnectHandler, Link, NotifyHandler, ServiceTable, Transport};

pub use govee_proto::{ColorMode, LightState};

/// Read/notify characteristic, see [`govee_proto::ble::READ_CHARACTERISTIC_UUID`]
pub const READ_CHARACTERISTIC: Uuid = Uuid::from_u128(0x00010203_0405_0607_0809_0a0b0c0d2b10);

/// Write characteristic, see [`govee_proto::ble::WRITE_CHARACTERISTIC_UUID`]
pub const WRITE_CHARACTERISTIC: Uuid = Uuid::from_u128(0x00010203_0405_0607_0809_0a0b0c0d2b11);
