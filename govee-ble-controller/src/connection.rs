//! Connection lifecycle: connect, resolve, subscribe, idle disconnect
//!
//! The manager owns the only link to the bulb. Callers ask for a connected
//! link with [`ConnectionManager::ensure_connected`]; concurrent callers are
//! coalesced into a single connection attempt by the connect lock.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use log::{debug, warn};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::transport::{DisconnectHandler, Link, NotifyHandler, ServiceTable, Transport};
use crate::{Error, Result, READ_CHARACTERISTIC, WRITE_CHARACTERISTIC};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// A live link with its resolved characteristics
pub struct Connected<L> {
    pub link: L,
    pub read: Uuid,
    pub write: Uuid,
    generation: u64,
}

struct Inner<L> {
    state: ConnectionState,
    current: Option<Arc<Connected<L>>>,
    idle_timer: Option<JoinHandle<()>>,
    // Bumped on every connection attempt so late disconnect events from an
    // older link are recognised and ignored.
    generation: u64,
}

pub struct ConnectionManager<T: Transport> {
    transport: T,
    name: String,
    on_notify: NotifyHandler,
    idle_timeout: Duration,
    connect_lock: tokio::sync::Mutex<()>,
    inner: Mutex<Inner<T::Link>>,
    expected_disconnect: AtomicBool,
    this: Weak<Self>,
}

impl<T: Transport> ConnectionManager<T> {
    pub fn new(transport: T, config: &SessionConfig, on_notify: NotifyHandler) -> Arc<Self> {
        let name = transport.name().unwrap_or_else(|| transport.address());
        Arc::new_cyclic(|this| Self {
            transport,
            name,
            on_notify,
            idle_timeout: config.idle_timeout(),
            connect_lock: tokio::sync::Mutex::new(()),
            inner: Mutex::new(Inner {
                state: ConnectionState::Disconnected,
                current: None,
                idle_timer: None,
                generation: 0,
            }),
            expected_disconnect: AtomicBool::new(false),
            this: this.clone(),
        })
    }

    pub fn state(&self) -> ConnectionState {
        self.inner().state
    }

    /// Connected link, connecting first if needed. Resets the idle timer.
    pub async fn ensure_connected(&self) -> Result<Arc<Connected<T::Link>>> {
        if let Some(connected) = self.current().await {
            self.reset_idle_timer();
            return Ok(connected);
        }

        let _guard = match self.connect_lock.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                debug!(
                    "{}: Connection already in progress, waiting for it to complete",
                    self.name
                );
                self.connect_lock.lock().await
            }
        };

        // Check again while holding the lock
        if let Some(connected) = self.current().await {
            self.reset_idle_timer();
            return Ok(connected);
        }

        self.inner().state = ConnectionState::Connecting;
        match self.establish().await {
            Ok(connected) => {
                let connected = Arc::new(connected);
                {
                    let mut inner = self.inner();
                    inner.current = Some(connected.clone());
                    inner.state = ConnectionState::Connected;
                }
                self.reset_idle_timer();
                Ok(connected)
            }
            Err(e) => {
                self.inner().state = ConnectionState::Disconnected;
                Err(e)
            }
        }
    }

    /// Close the link. A no-op when already disconnected.
    pub async fn disconnect(&self) -> Result<()> {
        let _guard = self.connect_lock.lock().await;
        self.expected_disconnect.store(true, Ordering::SeqCst);
        let current = {
            let mut inner = self.inner();
            if let Some(timer) = inner.idle_timer.take() {
                timer.abort();
            }
            inner.state = ConnectionState::Disconnected;
            inner.current.take()
        };

        let Some(connected) = current else {
            return Ok(());
        };
        if !connected.link.is_connected().await {
            return Ok(());
        }
        if let Err(e) = connected.link.unsubscribe(&connected.read).await {
            debug!("{}: Failed to stop notifications: {}", self.name, e);
        }
        connected.link.disconnect().await
    }

    async fn current(&self) -> Option<Arc<Connected<T::Link>>> {
        let current = self.inner().current.clone()?;
        if current.link.is_connected().await {
            Some(current)
        } else {
            None
        }
    }

    async fn establish(&self) -> Result<Connected<T::Link>> {
        let generation = {
            let mut inner = self.inner();
            inner.generation += 1;
            inner.generation
        };
        let this = self.this.clone();
        let on_disconnect: DisconnectHandler = Arc::new(move || {
            if let Some(manager) = this.upgrade() {
                manager.on_transport_disconnect(generation);
            }
        });

        debug!("{}: Connecting", self.name);
        let link = self.transport.connect(on_disconnect).await?;
        debug!("{}: Connected", self.name);

        let (read, write) = match self.resolve(&link).await {
            Ok(found) => found,
            Err(e) => {
                self.abandon(&link).await;
                return Err(e);
            }
        };

        debug!("{}: Subscribe to notifications", self.name);
        if let Err(e) = link.subscribe(&read, self.on_notify.clone()).await {
            self.abandon(&link).await;
            return Err(e);
        }

        Ok(Connected {
            link,
            read,
            write,
            generation,
        })
    }

    async fn resolve(&self, link: &T::Link) -> Result<(Uuid, Uuid)> {
        if let Some(found) = lookup(&link.services(false).await?) {
            return Ok(found);
        }
        // Services sometimes fail to load on the first discovery
        debug!("{}: Characteristics not found, refreshing services", self.name);
        let services = link.services(true).await?;
        lookup(&services).ok_or_else(|| {
            let missing = if services.get_characteristic(&READ_CHARACTERISTIC).is_none() {
                READ_CHARACTERISTIC
            } else {
                WRITE_CHARACTERISTIC
            };
            Error::CharacteristicMissing(missing.to_string())
        })
    }

    async fn abandon(&self, link: &T::Link) {
        self.expected_disconnect.store(true, Ordering::SeqCst);
        if let Err(e) = link.disconnect().await {
            debug!("{}: Failed to drop half-open link: {}", self.name, e);
        }
    }

    fn reset_idle_timer(&self) {
        self.expected_disconnect.store(false, Ordering::SeqCst);
        let this = self.this.clone();
        let delay = self.idle_timeout;

        // Abort and replace under the same lock so two timers are never armed
        let mut inner = self.inner();
        if let Some(timer) = inner.idle_timer.take() {
            timer.abort();
        }
        inner.idle_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(manager) = this.upgrade() {
                manager.on_idle();
            }
        }));
    }

    fn on_idle(self: Arc<Self>) {
        // Detached: a timer reset must not abort a disconnect halfway through
        tokio::spawn(async move {
            debug!(
                "{}: Disconnecting after timeout of {}s",
                self.name,
                self.idle_timeout.as_secs()
            );
            if let Err(e) = self.disconnect().await {
                warn!("{}: Idle disconnect failed: {}", self.name, e);
            }
        });
    }

    fn on_transport_disconnect(&self, generation: u64) {
        if self.expected_disconnect.load(Ordering::SeqCst) {
            debug!("{}: Disconnected from device", self.name);
            return;
        }
        let mut inner = self.inner();
        if inner.generation != generation {
            return;
        }
        debug!("{}: Device unexpectedly disconnected", self.name);
        let stale = inner
            .current
            .as_ref()
            .is_some_and(|c| c.generation == generation);
        if stale {
            inner.current = None;
        }
        if inner.state == ConnectionState::Connected {
            inner.state = ConnectionState::Disconnected;
            if let Some(timer) = inner.idle_timer.take() {
                timer.abort();
            }
        }
    }

    fn inner(&self) -> MutexGuard<'_, Inner<T::Link>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn lookup(services: &ServiceTable) -> Option<(Uuid, Uuid)> {
    Some((
        services.get_characteristic(&READ_CHARACTERISTIC)?,
        services.get_characteristic(&WRITE_CHARACTERISTIC)?,
    ))
}
