//! Websocket client for a Buttplug server
//!
//! Requests are strictly sequential: each one is sent with a fresh id and the
//! client reads frames until the matching reply arrives. Events that arrive
//! in between update the device table and are queued for
//! [`ButtplugClient::next_event`].

use super::messages::{
    decode, encode, ButtplugMessage, DeviceInfo, ScalarCmd, SensorReading, ServerInfo,
    MESSAGE_VERSION,
};
use crate::error::{ControlError, Result};
use futures::{SinkExt, StreamExt};
use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

/// How long to wait for the server to answer a request
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connected Buttplug client
pub struct ButtplugClient {
    ws: WsStream,
    next_id: u32,
    server: ServerInfo,
    devices: BTreeMap<u32, DeviceInfo>,
    pending_events: VecDeque<ButtplugMessage>,
    request_timeout: Duration,
    scanning: bool,
}

impl ButtplugClient {
    /// Connect, perform the handshake and fetch the device list.
    pub async fn connect(address: &str, client_name: &str) -> Result<Self> {
        Self::connect_with_timeout(address, client_name, DEFAULT_REQUEST_TIMEOUT).await
    }

    pub async fn connect_with_timeout(
        address: &str,
        client_name: &str,
        request_timeout: Duration,
    ) -> Result<Self> {
        info!("Connecting to Buttplug server at {}", address);

        let (ws, _) = tokio::time::timeout(request_timeout, connect_async(address))
            .await
            .map_err(|_| ControlError::Connection(format!("Timed out connecting to {}", address)))?
            .map_err(|e| {
                ControlError::Connection(format!("Failed to connect to {}: {}", address, e))
            })?;

        let mut client = Self {
            ws,
            next_id: 1,
            server: ServerInfo {
                id: 0,
                server_name: String::new(),
                message_version: 0,
                max_ping_time: 0,
            },
            devices: BTreeMap::new(),
            pending_events: VecDeque::new(),
            request_timeout,
            scanning: false,
        };

        match client
            .request(ButtplugMessage::request_server_info(client_name))
            .await?
        {
            ButtplugMessage::ServerInfo(info) => {
                if info.message_version < MESSAGE_VERSION {
                    warn!(
                        "Server speaks protocol v{}, client expects v{}",
                        info.message_version, MESSAGE_VERSION
                    );
                }
                info!(
                    "Connected to '{}' (protocol v{}, max ping {} ms)",
                    info.server_name, info.message_version, info.max_ping_time
                );
                client.server = info;
            }
            other => {
                return Err(ControlError::Protocol(format!(
                    "Expected ServerInfo, got {}",
                    other.kind()
                )))
            }
        }

        let devices = client.request_device_list().await?;
        info!("Found {} device(s)", devices.len());
        Ok(client)
    }

    pub fn server_info(&self) -> &ServerInfo {
        &self.server
    }

    /// Half the server's ping timeout, or None if the server does not require pings
    pub fn ping_interval(&self) -> Option<Duration> {
        match self.server.max_ping_time {
            0 => None,
            ms => Some(Duration::from_millis(u64::from(ms) / 2).max(Duration::from_millis(1))),
        }
    }

    /// Known devices, ordered by index
    pub fn devices(&self) -> impl Iterator<Item = &DeviceInfo> {
        self.devices.values()
    }

    pub fn device(&self, index: u32) -> Option<&DeviceInfo> {
        self.devices.get(&index)
    }

    /// Device intensity commands go to: the first one that has scalar actuators
    pub fn selected_device(&self) -> Option<&DeviceInfo> {
        self.devices.values().find(|d| d.has_scalar_actuators())
    }

    pub fn is_scanning(&self) -> bool {
        self.scanning
    }

    // --- Requests ---

    /// Replace the device table with the server's current list
    pub async fn request_device_list(&mut self) -> Result<Vec<DeviceInfo>> {
        match self.request(ButtplugMessage::request_device_list()).await? {
            ButtplugMessage::DeviceList(list) => {
                self.devices = list
                    .devices
                    .iter()
                    .map(|d| (d.device_index, d.clone()))
                    .collect();
                Ok(list.devices)
            }
            other => Err(ControlError::Protocol(format!(
                "Expected DeviceList, got {}",
                other.kind()
            ))),
        }
    }

    pub async fn start_scanning(&mut self) -> Result<()> {
        self.expect_ok(ButtplugMessage::start_scanning()).await?;
        self.scanning = true;
        info!("Scanning for devices");
        Ok(())
    }

    pub async fn stop_scanning(&mut self) -> Result<()> {
        self.expect_ok(ButtplugMessage::stop_scanning()).await?;
        self.scanning = false;
        Ok(())
    }

    /// Set every scalar actuator of a device to `level` (0.0 - 1.0)
    pub async fn scalar(&mut self, device_index: u32, level: f64) -> Result<()> {
        let device = self.devices.get(&device_index).ok_or_else(|| {
            ControlError::DeviceNotFound(format!("No device with index {}", device_index))
        })?;
        if !device.has_scalar_actuators() {
            return Err(ControlError::DeviceNotFound(format!(
                "{} has no scalar actuators",
                device.name()
            )));
        }
        let command = ScalarCmd::for_all_actuators(device, level);
        self.expect_ok(ButtplugMessage::ScalarCmd(command)).await
    }

    /// Read one sensor. `sensor_index` indexes the device's sensor list.
    pub async fn read_sensor(
        &mut self,
        device_index: u32,
        sensor_index: u32,
    ) -> Result<SensorReading> {
        let device = self.devices.get(&device_index).ok_or_else(|| {
            ControlError::DeviceNotFound(format!("No device with index {}", device_index))
        })?;
        let sensor = device.sensors().get(sensor_index as usize).ok_or_else(|| {
            ControlError::DeviceNotFound(format!(
                "{} has no sensor {}",
                device.name(),
                sensor_index
            ))
        })?;
        let request =
            ButtplugMessage::sensor_read(device_index, sensor_index, &sensor.sensor_type);
        match self.request(request).await? {
            ButtplugMessage::SensorReading(reading) => Ok(reading),
            other => Err(ControlError::Protocol(format!(
                "Expected SensorReading, got {}",
                other.kind()
            ))),
        }
    }

    pub async fn stop_device(&mut self, device_index: u32) -> Result<()> {
        self.expect_ok(ButtplugMessage::stop_device(device_index))
            .await
    }

    pub async fn stop_all_devices(&mut self) -> Result<()> {
        self.expect_ok(ButtplugMessage::stop_all_devices()).await
    }

    pub async fn ping(&mut self) -> Result<()> {
        self.expect_ok(ButtplugMessage::ping()).await
    }

    /// Wait for the next server event. Returns None when the server closed the connection.
    pub async fn next_event(&mut self) -> Result<Option<ButtplugMessage>> {
        loop {
            if let Some(event) = self.pending_events.pop_front() {
                return Ok(Some(event));
            }
            let Some(messages) = self.read_frame().await? else {
                return Ok(None);
            };
            for message in messages {
                if message.is_event() {
                    self.apply_event(&message);
                    self.pending_events.push_back(message);
                } else {
                    debug!("Ignoring stray reply {} (id {})", message.kind(), message.id());
                }
            }
        }
    }

    /// Close the websocket
    pub async fn close(mut self) -> Result<()> {
        match self.ws.close(None).await {
            Ok(()) | Err(tokio_tungstenite::tungstenite::Error::ConnectionClosed) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    // --- Plumbing ---

    async fn expect_ok(&mut self, message: ButtplugMessage) -> Result<()> {
        match self.request(message).await? {
            ButtplugMessage::Ok(_) => Ok(()),
            other => Err(ControlError::Protocol(format!(
                "Expected Ok, got {}",
                other.kind()
            ))),
        }
    }

    async fn request(&mut self, mut message: ButtplugMessage) -> Result<ButtplugMessage> {
        let id = self.next_id;
        self.next_id = self.next_id.checked_add(1).unwrap_or(1);
        message.set_id(id);

        let kind = message.kind();
        let frame = encode(std::slice::from_ref(&message))?;
        debug!("-> {}", frame);
        self.ws.send(Message::Text(frame.into())).await?;

        let deadline = Instant::now() + self.request_timeout;
        loop {
            let frame = tokio::time::timeout_at(deadline, self.read_frame())
                .await
                .map_err(|_| {
                    ControlError::Connection(format!("Timed out waiting for reply to {}", kind))
                })??;
            let Some(messages) = frame else {
                return Err(ControlError::Connection(
                    "Server closed the connection".to_string(),
                ));
            };

            let mut reply = None;
            for message in messages {
                if message.id() == id {
                    reply = Some(message);
                } else if message.is_event() {
                    self.apply_event(&message);
                    self.pending_events.push_back(message);
                } else {
                    warn!(
                        "Unexpected reply {} with id {} while waiting for {}",
                        message.kind(),
                        message.id(),
                        id
                    );
                }
            }

            match reply {
                Some(ButtplugMessage::Error(e)) => {
                    return Err(ControlError::Server {
                        code: e.error_code,
                        message: e.error_message,
                    })
                }
                Some(reply) => return Ok(reply),
                None => continue,
            }
        }
    }

    /// Next text frame, decoded. None when the connection is closed.
    async fn read_frame(&mut self) -> Result<Option<Vec<ButtplugMessage>>> {
        loop {
            match self.ws.next().await {
                None | Some(Ok(Message::Close(_))) => return Ok(None),
                Some(Err(e)) => return Err(e.into()),
                Some(Ok(Message::Text(text))) => {
                    debug!("<- {}", text.as_str());
                    return decode(text.as_str()).map(Some);
                }
                // Transport pings are answered by tungstenite itself
                Some(Ok(_)) => continue,
            }
        }
    }

    fn apply_event(&mut self, message: &ButtplugMessage) {
        match message {
            ButtplugMessage::DeviceAdded(added) => {
                info!(
                    "Device added: [{}] {}",
                    added.device.device_index,
                    added.device.name()
                );
                self.devices
                    .insert(added.device.device_index, added.device.clone());
            }
            ButtplugMessage::DeviceRemoved(removed) => {
                if let Some(device) = self.devices.remove(&removed.device_index) {
                    info!("Device removed: [{}] {}", removed.device_index, device.name());
                }
            }
            ButtplugMessage::ScanningFinished(_) => {
                self.scanning = false;
                debug!("Scanning finished");
            }
            other => debug!("Unhandled event {}", other.kind()),
        }
    }
}
