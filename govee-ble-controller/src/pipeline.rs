//! Outbound command pipeline
//!
//! The link cannot multiplex, so every write goes through one operation
//! lock. Transient failures back off, force a disconnect and are retried on
//! a fresh connection, up to the configured number of attempts.

use std::sync::Arc;
use std::time::Duration;

use govee_proto::{Frame, to_hex};
use log::{debug, error};

use crate::config::SessionConfig;
use crate::connection::ConnectionManager;
use crate::transport::{Link, Transport};
use crate::{Error, Result};

pub struct CommandPipeline<T: Transport> {
    connection: Arc<ConnectionManager<T>>,
    operation_lock: tokio::sync::Mutex<()>,
    attempts: u32,
    backoff: Duration,
    name: String,
}

impl<T: Transport> CommandPipeline<T> {
    pub fn new(connection: Arc<ConnectionManager<T>>, config: &SessionConfig, name: String) -> Self {
        Self {
            connection,
            operation_lock: tokio::sync::Mutex::new(()),
            // At least one attempt, whatever the config says
            attempts: config.attempts.max(1),
            backoff: config.backoff(),
            name,
        }
    }

    /// Write `frames` in order, as one uninterrupted batch
    pub async fn send(&self, frames: &[Frame]) -> Result<()> {
        let commands: Vec<[u8; govee_proto::FRAME_LEN]> = frames.iter().map(Frame::to_bytes).collect();
        debug!(
            "{}: Sending commands {:?}",
            self.name,
            commands.iter().map(|c| to_hex(c)).collect::<Vec<_>>()
        );

        self.connection.ensure_connected().await?;

        let _guard = match self.operation_lock.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                debug!(
                    "{}: Operation already in progress, waiting for it to complete",
                    self.name
                );
                self.operation_lock.lock().await
            }
        };

        let mut last_error = None;
        for attempt in 1..=self.attempts {
            match self.send_locked(&commands).await {
                Ok(()) => return Ok(()),
                Err(e) if e.is_transient() => {
                    debug!(
                        "{}: communication failed (attempt {}/{}): {}",
                        self.name, attempt, self.attempts, e
                    );
                    last_error = Some(e);
                }
                Err(e @ Error::DeviceNotFound(_)) => {
                    error!(
                        "{}: device not found, no longer in range, or poor RSSI: {}",
                        self.name, e
                    );
                    return Err(e);
                }
                Err(e @ Error::CharacteristicMissing(_)) => {
                    debug!("{}: characteristic missing: {}", self.name, e);
                    return Err(e);
                }
                Err(e) => {
                    debug!("{}: communication failed: {}", self.name, e);
                    return Err(e);
                }
            }
        }

        Err(last_error.unwrap_or(Error::Unreachable("send loop ran no attempts")))
    }

    async fn send_locked(&self, commands: &[[u8; govee_proto::FRAME_LEN]]) -> Result<()> {
        let result = self.execute(commands).await;
        match &result {
            Err(e) if e.is_transient() => {
                // Disconnect so the next attempt starts from a fresh link
                tokio::time::sleep(self.backoff).await;
                debug!(
                    "{}: Backing off {:?}; Disconnecting due to error: {}",
                    self.name, self.backoff, e
                );
                self.force_disconnect().await;
            }
            Err(e) if e.is_transport() => {
                debug!("{}: Disconnecting due to error: {}", self.name, e);
                self.force_disconnect().await;
            }
            _ => {}
        }
        result
    }

    async fn execute(&self, commands: &[[u8; govee_proto::FRAME_LEN]]) -> Result<()> {
        let connected = self.connection.ensure_connected().await?;
        for command in commands {
            connected.link.write(&connected.write, command).await?;
        }
        Ok(())
    }

    async fn force_disconnect(&self) {
        if let Err(e) = self.connection.disconnect().await {
            debug!("{}: Disconnect after failure also failed: {}", self.name, e);
        }
    }
}
