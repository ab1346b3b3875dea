//! Scripted in-memory transport standing in for a bulb

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use govee_ble_controller::{
    DisconnectHandler, Error, GoveeInstance, Link, NotifyHandler, READ_CHARACTERISTIC, Result,
    ServiceTable, SessionConfig, Transport, WRITE_CHARACTERISTIC,
};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fail {
    Transient,
    NotFound,
    Other,
}

impl Fail {
    fn error(self) -> Error {
        match self {
            Fail::Transient => Error::Transient("link hiccup".into()),
            Fail::NotFound => Error::DeviceNotFound("bulb gone".into()),
            Fail::Other => Error::Transport("unsupported".into()),
        }
    }
}

pub struct Script {
    pub connected: bool,
    pub connects: usize,
    pub disconnects: usize,
    pub unsubscribes: usize,
    pub service_loads: usize,
    pub characteristics: Vec<Uuid>,
    /// First, non-refreshed service load comes back empty
    pub services_need_refresh: bool,
    pub write_attempts: usize,
    pub writes: Vec<Vec<u8>>,
    pub fail_writes: VecDeque<Fail>,
    pub fail_every_write: Option<Fail>,
    pub on_notify: Option<NotifyHandler>,
    pub on_disconnect: Option<DisconnectHandler>,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            connected: false,
            connects: 0,
            disconnects: 0,
            unsubscribes: 0,
            service_loads: 0,
            characteristics: vec![READ_CHARACTERISTIC, WRITE_CHARACTERISTIC],
            services_need_refresh: false,
            write_attempts: 0,
            writes: Vec::new(),
            fail_writes: VecDeque::new(),
            fail_every_write: None,
            on_notify: None,
            on_disconnect: None,
        }
    }
}

/// Test-side handle on the fake bulb
#[derive(Clone, Default)]
pub struct FakeDevice {
    script: Arc<Mutex<Script>>,
}

impl FakeDevice {
    pub fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap()
    }

    pub fn transport(&self) -> FakeTransport {
        FakeTransport {
            device: self.clone(),
        }
    }

    pub fn session(&self) -> GoveeInstance<FakeTransport> {
        GoveeInstance::new(self.transport())
    }

    pub fn session_with(&self, config: SessionConfig) -> GoveeInstance<FakeTransport> {
        GoveeInstance::with_config(self.transport(), config)
    }

    /// Deliver a notification as the bulb would
    pub fn notify(&self, data: &[u8]) {
        let handler = self.script().on_notify.clone();
        if let Some(handler) = handler {
            handler(data);
        }
    }

    /// Drop the link from the device side
    pub fn drop_link(&self) {
        let handler = {
            let mut script = self.script();
            script.connected = false;
            script.on_disconnect.clone()
        };
        if let Some(handler) = handler {
            handler();
        }
    }

    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.script().writes.clone()
    }
}

pub struct FakeTransport {
    device: FakeDevice,
}

#[async_trait]
impl Transport for FakeTransport {
    type Link = FakeLink;

    async fn connect(&self, on_disconnect: DisconnectHandler) -> Result<FakeLink> {
        // Give concurrent callers a chance to pile up on the connect lock
        tokio::time::sleep(Duration::from_millis(10)).await;
        let mut script = self.device.script();
        script.connects += 1;
        script.connected = true;
        script.on_disconnect = Some(on_disconnect);
        Ok(FakeLink {
            device: self.device.clone(),
        })
    }

    fn name(&self) -> Option<String> {
        Some("GBK_H613B_TEST".into())
    }

    fn address(&self) -> String {
        "A4:C1:38:00:00:01".into()
    }
}

pub struct FakeLink {
    device: FakeDevice,
}

#[async_trait]
impl Link for FakeLink {
    async fn is_connected(&self) -> bool {
        self.device.script().connected
    }

    async fn services(&self, refresh: bool) -> Result<ServiceTable> {
        let mut script = self.device.script();
        script.service_loads += 1;
        if script.services_need_refresh && !refresh {
            return Ok(ServiceTable::default());
        }
        Ok(ServiceTable::new(script.characteristics.clone()))
    }

    async fn write(&self, characteristic: &Uuid, data: &[u8]) -> Result<()> {
        assert_eq!(*characteristic, WRITE_CHARACTERISTIC);
        let mut script = self.device.script();
        script.write_attempts += 1;
        if let Some(fail) = script.fail_every_write {
            return Err(fail.error());
        }
        if let Some(fail) = script.fail_writes.pop_front() {
            return Err(fail.error());
        }
        script.writes.push(data.to_vec());
        Ok(())
    }

    async fn subscribe(&self, characteristic: &Uuid, on_notify: NotifyHandler) -> Result<()> {
        assert_eq!(*characteristic, READ_CHARACTERISTIC);
        self.device.script().on_notify = Some(on_notify);
        Ok(())
    }

    async fn unsubscribe(&self, _characteristic: &Uuid) -> Result<()> {
        let mut script = self.device.script();
        script.unsubscribes += 1;
        script.on_notify = None;
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        let handler = {
            let mut script = self.device.script();
            script.disconnects += 1;
            script.connected = false;
            script.on_disconnect.clone()
        };
        if let Some(handler) = handler {
            handler();
        }
        Ok(())
    }
}

/// Parse a hex string into bytes
pub fn hex(s: &str) -> Vec<u8> {
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
        .collect()
}

/// Collects every state passed to a callback
pub fn recorder<T: Transport>(
    light: &GoveeInstance<T>,
) -> Arc<Mutex<Vec<govee_ble_controller::LightState>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    light.register_callback(move |state| sink.lock().unwrap().push(*state));
    seen
}
