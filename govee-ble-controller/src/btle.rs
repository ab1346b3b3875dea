//! btleplug backed transport and discovery
//!
//! Discovery is not part of the session: it only produces the peripheral
//! handed to [`BtleTransport`].

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use btleplug::api::{
    Central, CentralEvent, Characteristic, Manager as _, Peripheral as _, ScanFilter, WriteType,
};
use btleplug::platform::{Adapter, Manager, Peripheral};
use futures::StreamExt;
use govee_proto::ble::is_govee_name;
use log::debug;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::session::GoveeInstance;
use crate::transport::{DisconnectHandler, Link, NotifyHandler, ServiceTable, Transport};
use crate::{Error, Result};

/// A discovered device
#[derive(Debug, Clone)]
pub struct GoveeDevice {
    pub name: String,
    pub address: String,
    pub rssi: Option<i16>,
    pub is_govee: bool,
}

/// Get the default Bluetooth adapter
pub async fn get_adapter() -> Result<Adapter> {
    let manager = Manager::new().await?;
    let adapters = manager.adapters().await?;
    adapters
        .into_iter()
        .next()
        .ok_or_else(|| Error::Transport("No Bluetooth adapter found".into()))
}

/// Scan for BLE devices
///
/// Returns every device seen; H613B bulbs have `is_govee = true`.
pub async fn scan(adapter: &Adapter, duration: Duration) -> Result<Vec<GoveeDevice>> {
    adapter.start_scan(ScanFilter::default()).await?;
    tokio::time::sleep(duration).await;

    let peripherals = adapter.peripherals().await?;
    let mut devices = Vec::new();

    for peripheral in peripherals {
        if let Some(props) = peripheral.properties().await? {
            let name = props.local_name.unwrap_or_else(|| "Unknown".to_string());
            let address = peripheral.address().to_string();
            let is_govee = is_govee_name(&name);
            devices.push(GoveeDevice {
                name,
                address,
                rssi: props.rssi,
                is_govee,
            });
        }
    }

    adapter.stop_scan().await?;
    Ok(devices)
}

/// Find a bulb by name/address pattern, or the first H613B seen
pub async fn find_device(
    adapter: &Adapter,
    target: Option<&str>,
    duration: Duration,
) -> Result<Peripheral> {
    adapter.start_scan(ScanFilter::default()).await?;
    tokio::time::sleep(duration).await;

    let peripherals = adapter.peripherals().await?;

    for peripheral in peripherals {
        if let Some(props) = peripheral.properties().await? {
            let name = props.local_name.unwrap_or_default();
            let addr = peripheral.address().to_string();

            let matches = match target {
                Some(t) => name.contains(t) || addr.eq_ignore_ascii_case(t),
                None => is_govee_name(&name),
            };

            if matches {
                adapter.stop_scan().await?;
                debug!("Found device: {} ({})", name, addr);
                return Ok(peripheral);
            }
        }
    }

    adapter.stop_scan().await?;
    Err(Error::DeviceNotFound(
        target.unwrap_or("no H613B bulb in range").to_string(),
    ))
}

/// Discover a bulb and open a session on it. Nothing is connected yet.
pub async fn open(
    target: Option<&str>,
    scan_duration: Duration,
    config: SessionConfig,
) -> Result<GoveeInstance<BtleTransport>> {
    config.validate()?;
    let adapter = get_adapter().await?;
    let peripheral = find_device(&adapter, target, scan_duration).await?;
    let transport = BtleTransport::new(adapter, peripheral, &config).await?;
    Ok(GoveeInstance::with_config(transport, config))
}

pub struct BtleTransport {
    adapter: Adapter,
    peripheral: Peripheral,
    name: Option<String>,
    connect_attempts: u32,
    backoff: Duration,
}

impl BtleTransport {
    pub async fn new(adapter: Adapter, peripheral: Peripheral, config: &SessionConfig) -> Result<Self> {
        let name = peripheral.properties().await?.and_then(|p| p.local_name);
        Ok(Self {
            adapter,
            peripheral,
            name,
            connect_attempts: config.connect_attempts.max(1),
            backoff: config.backoff(),
        })
    }
}

#[async_trait]
impl Transport for BtleTransport {
    type Link = BtleLink;

    async fn connect(&self, on_disconnect: DisconnectHandler) -> Result<BtleLink> {
        let mut events = self.adapter.events().await?;

        let mut attempt = 1;
        loop {
            match self.peripheral.connect().await.map_err(Error::from) {
                Ok(()) => break,
                Err(e) if e.is_transient() && attempt < self.connect_attempts => {
                    debug!(
                        "{}: Connect attempt {}/{} failed: {}",
                        self.address(),
                        attempt,
                        self.connect_attempts,
                        e
                    );
                    attempt += 1;
                    tokio::time::sleep(self.backoff).await;
                }
                Err(e) => return Err(e),
            }
        }

        let id = self.peripheral.id();
        let watcher = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if let CentralEvent::DeviceDisconnected(gone) = event {
                    if gone == id {
                        on_disconnect();
                        break;
                    }
                }
            }
        });

        Ok(BtleLink {
            peripheral: self.peripheral.clone(),
            watcher,
            notifier: Mutex::new(None),
        })
    }

    fn name(&self) -> Option<String> {
        self.name.clone()
    }

    fn address(&self) -> String {
        self.peripheral.address().to_string()
    }
}

pub struct BtleLink {
    peripheral: Peripheral,
    watcher: JoinHandle<()>,
    notifier: Mutex<Option<JoinHandle<()>>>,
}

impl BtleLink {
    fn characteristic(&self, uuid: &Uuid) -> Result<Characteristic> {
        self.peripheral
            .characteristics()
            .into_iter()
            .find(|c| c.uuid == *uuid)
            .ok_or_else(|| Error::CharacteristicMissing(uuid.to_string()))
    }

    fn stop_notifier(&self) {
        let task = self.notifier.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(task) = task {
            task.abort();
        }
    }
}

#[async_trait]
impl Link for BtleLink {
    async fn is_connected(&self) -> bool {
        self.peripheral.is_connected().await.unwrap_or(false)
    }

    async fn services(&self, refresh: bool) -> Result<ServiceTable> {
        if refresh || self.peripheral.characteristics().is_empty() {
            self.peripheral.discover_services().await?;
        }
        let characteristics = self
            .peripheral
            .characteristics()
            .iter()
            .map(|c| c.uuid)
            .collect();
        Ok(ServiceTable::new(characteristics))
    }

    async fn write(&self, characteristic: &Uuid, data: &[u8]) -> Result<()> {
        let characteristic = self.characteristic(characteristic)?;
        self.peripheral
            .write(&characteristic, data, WriteType::WithoutResponse)
            .await?;
        Ok(())
    }

    async fn subscribe(&self, characteristic: &Uuid, on_notify: NotifyHandler) -> Result<()> {
        let characteristic = self.characteristic(characteristic)?;
        self.peripheral.subscribe(&characteristic).await?;
        let mut notifications = self.peripheral.notifications().await?;

        let uuid = characteristic.uuid;
        let task = tokio::spawn(async move {
            while let Some(notification) = notifications.next().await {
                if notification.uuid == uuid {
                    on_notify(notification.value.as_slice());
                }
            }
        });
        let previous = self
            .notifier
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .replace(task);
        if let Some(previous) = previous {
            previous.abort();
        }
        Ok(())
    }

    async fn unsubscribe(&self, characteristic: &Uuid) -> Result<()> {
        self.stop_notifier();
        let characteristic = self.characteristic(characteristic)?;
        self.peripheral.unsubscribe(&characteristic).await?;
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.stop_notifier();
        self.peripheral.disconnect().await?;
        Ok(())
    }
}

impl Drop for BtleLink {
    fn drop(&mut self) {
        self.stop_notifier();
        self.watcher.abort();
    }
}
