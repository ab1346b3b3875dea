//! Transport capability the session is built on
//!
//! A `Transport` establishes links to one bulb; a `Link` is a connected
//! handle. The btleplug backend lives in [`crate::btle`]; tests plug in a
//! scripted fake.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::Result;

/// Called with the raw bytes of every notification on a subscribed characteristic
pub type NotifyHandler = Arc<dyn Fn(&[u8]) + Send + Sync>;

/// Called by the transport when the link drops, whoever initiated it
pub type DisconnectHandler = Arc<dyn Fn() + Send + Sync>;

/// Characteristics discovered on the connected device
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceTable {
    pub characteristics: Vec<Uuid>,
}

impl ServiceTable {
    pub fn new(characteristics: Vec<Uuid>) -> Self {
        Self { characteristics }
    }

    pub fn get_characteristic(&self, uuid: &Uuid) -> Option<Uuid> {
        self.characteristics.iter().find(|c| *c == uuid).copied()
    }
}

#[async_trait]
pub trait Transport: Send + Sync + 'static {
    type Link: Link;

    /// Establish a link, retrying transient failures internally
    async fn connect(&self, on_disconnect: DisconnectHandler) -> Result<Self::Link>;

    /// Advertised device name, if known
    fn name(&self) -> Option<String>;

    fn address(&self) -> String;
}

#[async_trait]
pub trait Link: Send + Sync + 'static {
    async fn is_connected(&self) -> bool;

    /// Service table; `refresh` forces a new service discovery
    async fn services(&self, refresh: bool) -> Result<ServiceTable>;

    async fn write(&self, characteristic: &Uuid, data: &[u8]) -> Result<()>;

    async fn subscribe(&self, characteristic: &Uuid, on_notify: NotifyHandler) -> Result<()>;

    async fn unsubscribe(&self, characteristic: &Uuid) -> Result<()>;

    async fn disconnect(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_lookup() {
        let read = Uuid::from_u128(1);
        let table = ServiceTable::new(vec![read]);
        assert_eq!(table.get_characteristic(&read), Some(read));
        assert_eq!(table.get_characteristic(&Uuid::from_u128(2)), None);
    }
}
