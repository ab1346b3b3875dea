//! Session with one bulb
//!
//! `GoveeInstance` composes the connection manager and command pipeline and
//! owns the authoritative [`LightState`]. State changes come from two
//! places: confirmed local commands, applied optimistically once the write
//! succeeded, and state reports decoded from notifications. Both replace the
//! snapshot wholesale and then fire the registered callbacks in order.

use std::sync::{Arc, Mutex, RwLock};

use govee_proto::notification::Notification;
use govee_proto::{CMD_BRIGHTNESS, CMD_COLOR, CMD_POWER, Frame, LightState, palette, to_hex};
use log::{debug, warn};

use crate::callbacks::{self, Callback, CallbackId, CallbackRegistry};
use crate::config::SessionConfig;
use crate::connection::{ConnectionManager, ConnectionState};
use crate::pipeline::CommandPipeline;
use crate::transport::{NotifyHandler, Transport};
use crate::{Error, Result};

/// State shared with the notification handler
struct Shared {
    name: String,
    state: RwLock<LightState>,
    callbacks: Mutex<CallbackRegistry>,
    // Held across replace and fire so observers see updates in state order
    dispatch: Mutex<()>,
}

impl Shared {
    fn state(&self) -> LightState {
        *self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Replace the snapshot and notify observers
    fn replace(&self, update: impl FnOnce(LightState) -> LightState) {
        let _dispatch = self.dispatch.lock().unwrap_or_else(|e| e.into_inner());
        let new_state = {
            let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
            *state = update(*state);
            *state
        };
        let callbacks = self
            .callbacks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .snapshot();
        callbacks::fire(&self.name, &callbacks, &new_state);
    }

    fn handle_notification(&self, data: &[u8]) {
        debug!("{}: Notification received: {}", self.name, to_hex(data));
        match Notification::parse(data) {
            Ok(Some(notification)) => {
                self.replace(|state| notification.apply(state));
                debug!("{}: State after notification: {:?}", self.name, self.state());
            }
            Ok(None) => {}
            Err(e) => warn!("{}: Dropping notification: {}", self.name, e),
        }
    }
}

pub struct GoveeInstance<T: Transport> {
    shared: Arc<Shared>,
    address: String,
    connection: Arc<ConnectionManager<T>>,
    pipeline: CommandPipeline<T>,
}

impl<T: Transport> GoveeInstance<T> {
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, SessionConfig::default())
    }

    pub fn with_config(transport: T, config: SessionConfig) -> Self {
        let name = transport.name().unwrap_or_else(|| transport.address());
        let address = transport.address();
        let shared = Arc::new(Shared {
            name: name.clone(),
            state: RwLock::new(LightState::default()),
            callbacks: Mutex::new(CallbackRegistry::default()),
            dispatch: Mutex::new(()),
        });

        let weak = Arc::downgrade(&shared);
        let on_notify: NotifyHandler = Arc::new(move |data: &[u8]| {
            if let Some(shared) = weak.upgrade() {
                shared.handle_notification(data);
            }
        });

        let connection = ConnectionManager::new(transport, &config, on_notify);
        let pipeline = CommandPipeline::new(connection.clone(), &config, name);
        Self {
            shared,
            address,
            connection,
            pipeline,
        }
    }

    /// Device name, or the address when the device did not advertise one
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn state(&self) -> LightState {
        self.shared.state()
    }

    pub fn is_on(&self) -> bool {
        self.state().power
    }

    pub fn rgb(&self) -> (u8, u8, u8) {
        self.state().rgb
    }

    pub fn white_index(&self) -> u8 {
        self.state().white_index
    }

    /// Raw brightness 0-255
    pub fn brightness(&self) -> u8 {
        self.state().brightness
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub async fn turn_on(&self) -> Result<()> {
        debug!("{}: Turn on", self.name());
        self.command(Frame::power(true), |s| s.with_power(true)).await
    }

    pub async fn turn_off(&self) -> Result<()> {
        debug!("{}: Turn off", self.name());
        self.command(Frame::power(false), |s| s.with_power(false)).await
    }

    pub async fn set_color(&self, r: u8, g: u8, b: u8) -> Result<()> {
        debug!("{}: Set color: ({}, {}, {})", self.name(), r, g, b);
        self.command(Frame::color(r, g, b), |s| s.with_rgb((r, g, b)))
            .await
    }

    /// Raw brightness. The bulb accepts 0-255 but only does anything useful
    /// with 1-100, which is what the official app sends.
    pub async fn set_brightness(&self, value: u8) -> Result<()> {
        debug!("{}: Set brightness: {}", self.name(), value);
        self.command(Frame::brightness(value), |s| s.with_brightness(value))
            .await
    }

    pub async fn set_brightness_percent(&self, percent: u8) -> Result<()> {
        if percent > 100 {
            return Err(Error::InvalidArgument(format!(
                "brightness percent out of range: {percent}"
            )));
        }
        self.set_brightness(percent).await
    }

    /// White mode. `intensity` 0-255 selects a shade from warm to cool.
    pub async fn set_white(&self, intensity: u8) -> Result<()> {
        debug!("{}: Set white: {}", self.name(), intensity);
        let index = palette::white_index(intensity);
        let frame = Frame::white(palette::shade(index));
        self.command(frame, |s| s.with_white(index as u8)).await
    }

    /// Ask the bulb for power, colour and brightness.
    ///
    /// State changes when the answers arrive as notifications, not when this
    /// returns.
    pub async fn update(&self) -> Result<()> {
        debug!("{}: Updating state", self.name());
        let queries = [
            Frame::query(CMD_POWER, &[])?,
            Frame::query(CMD_COLOR, &[0x01])?,
            Frame::query(CMD_BRIGHTNESS, &[])?,
        ];
        self.pipeline.send(&queries).await
    }

    pub async fn disconnect(&self) -> Result<()> {
        debug!("{}: Disconnect", self.name());
        self.connection.disconnect().await
    }

    /// Called after every confirmed change, with the new state
    pub fn register_callback<F>(&self, callback: F) -> CallbackId
    where
        F: Fn(&LightState) + Send + Sync + 'static,
    {
        let callback: Callback = Arc::new(callback);
        self.shared
            .callbacks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .register(callback)
    }

    pub fn unregister_callback(&self, id: CallbackId) -> bool {
        self.shared
            .callbacks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .unregister(id)
    }

    async fn command(
        &self,
        frame: Frame,
        update: impl FnOnce(LightState) -> LightState,
    ) -> Result<()> {
        self.pipeline.send(&[frame]).await?;
        self.shared.replace(update);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shared() -> Arc<Shared> {
        Arc::new(Shared {
            name: "test".into(),
            state: RwLock::new(LightState::default()),
            callbacks: Mutex::new(CallbackRegistry::default()),
            dispatch: Mutex::new(()),
        })
    }

    #[test]
    fn concurrent_updates_reach_observers_in_state_order() {
        let shared = shared();
        let seen = Arc::new(Mutex::new(Vec::new()));
        {
            let seen = seen.clone();
            let callback: Callback = Arc::new(move |s: &LightState| {
                seen.lock().unwrap().push(s.brightness);
                std::thread::yield_now();
            });
            shared.callbacks.lock().unwrap().register(callback);
        }

        let threads: Vec<_> = (0..4u8)
            .map(|t| {
                let shared = shared.clone();
                std::thread::spawn(move || {
                    for i in 0..50u8 {
                        let value = t * 50 + i;
                        shared.replace(|s| s.with_brightness(value));
                    }
                })
            })
            .collect();
        for thread in threads {
            thread.join().unwrap();
        }

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 200);
        assert_eq!(seen.last().copied(), Some(shared.state().brightness));
    }
}
