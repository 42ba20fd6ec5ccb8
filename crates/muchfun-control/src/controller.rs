use crate::buttplug::ButtplugClient;
use crate::error::{ControlError, Result};
use muchfun_core::{
    CommandStats, DeviceCommand, Intensity, DEFAULT_CLIENT_NAME, DEFAULT_SERVER_ADDRESS,
};
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Connection lifecycle as seen by the GUI and the output tick
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Error(String),
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connecting => write!(f, "Connecting..."),
            Self::Connected => write!(f, "Connected"),
            Self::Error(e) => write!(f, "Error: {}", e),
        }
    }
}

/// Why a stop was issued, recorded in the log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Emergency stop pressed
    UserAbort,
    Disconnect,
    Shutdown,
}

/// The device intensity commands are sent to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSummary {
    pub index: u32,
    pub name: String,
    pub scalar_actuators: usize,
}

/// Snapshot shared between the client task and the GUI
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControllerStatus {
    pub state: ConnectionState,
    pub server_name: Option<String>,
    pub device: Option<DeviceSummary>,
    pub device_count: usize,
    pub scanning: bool,
}

impl ControllerStatus {
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Connected and a device is available for intensity commands
    pub fn can_send(&self) -> bool {
        self.is_connected() && self.device.is_some()
    }

    /// One-line status for the GUI
    pub fn status_text(&self) -> String {
        match (&self.state, &self.device) {
            (ConnectionState::Connected, Some(device)) => format!("Connected to {}", device.name),
            (ConnectionState::Connected, None) if self.scanning => {
                "Connected - Scanning for devices...".to_string()
            }
            (ConnectionState::Connected, None) => "Connected - No devices found".to_string(),
            (ConnectionState::Error(e), _) => format!("Connection failed: {}", e),
            (state, _) => state.to_string(),
        }
    }
}

/// Controller settings
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub address: String,
    pub client_name: String,
    /// Intensity frames buffered before new ones are dropped
    pub channel_capacity: usize,
    pub request_timeout: Duration,
    /// Start scanning after connecting when no device is present
    pub scan_when_empty: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_SERVER_ADDRESS.to_string(),
            client_name: DEFAULT_CLIENT_NAME.to_string(),
            channel_capacity: 8,
            request_timeout: crate::buttplug::DEFAULT_REQUEST_TIMEOUT,
            scan_when_empty: true,
        }
    }
}

/// Requests on the priority path, handled before any queued intensity frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ControlRequest {
    Stop(StopReason),
    StartScanning,
    RefreshDevices,
}

struct Link {
    commands: mpsc::Sender<Intensity>,
    control: mpsc::Sender<ControlRequest>,
    handle: JoinHandle<()>,
}

/// State the client task writes into.
///
/// Each connection gets a generation number; a task that outlives its
/// connection (e.g. still closing after a reconnect) stops publishing.
#[derive(Clone)]
struct Shared {
    status: Arc<RwLock<ControllerStatus>>,
    stats: Arc<Mutex<CommandStats>>,
    resend: Arc<AtomicBool>,
    generation: Arc<AtomicU64>,
    my_generation: u64,
}

impl Shared {
    fn update(&self, f: impl FnOnce(&mut ControllerStatus)) {
        if self.generation.load(Ordering::SeqCst) == self.my_generation {
            let mut status = self.status.write();
            f(&mut status);
        }
    }

    fn set_state(&self, state: ConnectionState) {
        self.update(|status| {
            status.state = state;
            if status.state != ConnectionState::Connected {
                status.device = None;
                status.device_count = 0;
                status.scanning = false;
            }
        });
    }

    fn publish(&self, client: &ButtplugClient) {
        let device = client.selected_device().map(|d| DeviceSummary {
            index: d.device_index,
            name: d.name().to_string(),
            scalar_actuators: d.scalar_actuators().len(),
        });
        let device_count = client.devices().count();
        let server_name = client.server_info().server_name.clone();
        let scanning = client.is_scanning();
        self.update(|status| {
            status.state = ConnectionState::Connected;
            status.server_name = Some(server_name);
            status.device = device;
            status.device_count = device_count;
            status.scanning = scanning;
        });
    }

    fn request_resend(&self) {
        self.resend.store(true, Ordering::SeqCst);
    }
}

/// Owns the connection to the Buttplug server.
///
/// All methods are synchronous and never block: commands are handed to an
/// async client task on the given runtime.
pub struct DeviceController {
    runtime: Handle,
    config: ControllerConfig,
    status: Arc<RwLock<ControllerStatus>>,
    stats: Arc<Mutex<CommandStats>>,
    resend: Arc<AtomicBool>,
    generation: Arc<AtomicU64>,
    link: Option<Link>,
}

impl DeviceController {
    pub fn new(runtime: Handle, config: ControllerConfig) -> Self {
        Self {
            runtime,
            config,
            status: Arc::new(RwLock::new(ControllerStatus::default())),
            stats: Arc::new(Mutex::new(CommandStats::default())),
            resend: Arc::new(AtomicBool::new(false)),
            generation: Arc::new(AtomicU64::new(0)),
            link: None,
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Update the configuration. Takes effect on the next connect.
    pub fn update_config(&mut self, config: ControllerConfig) {
        self.config = config;
    }

    pub fn status(&self) -> ControllerStatus {
        self.status.read().clone()
    }

    pub fn state(&self) -> ConnectionState {
        self.status.read().state.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.status.read().is_connected()
    }

    /// Whether intensity commands currently reach a device
    pub fn can_send(&self) -> bool {
        self.status.read().can_send()
    }

    /// Snapshot of the command statistics, with the rate window advanced to now
    pub fn stats(&self) -> CommandStats {
        let mut stats = self.stats.lock();
        stats.update(Instant::now());
        stats.clone()
    }

    /// True once after the client task failed to deliver a command
    pub fn take_resend_request(&self) -> bool {
        self.resend.swap(false, Ordering::SeqCst)
    }

    /// Start connecting in the background. State moves to Connecting and then
    /// to Connected or Error.
    pub fn connect(&mut self) {
        if let Some(link) = &self.link {
            if !link.handle.is_finished() {
                debug!("Connect ignored, client task already running");
                return;
            }
        }

        let my_generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let shared = Shared {
            status: Arc::clone(&self.status),
            stats: Arc::clone(&self.stats),
            resend: Arc::clone(&self.resend),
            generation: Arc::clone(&self.generation),
            my_generation,
        };
        shared.set_state(ConnectionState::Connecting);

        let (commands_tx, commands_rx) = mpsc::channel(self.config.channel_capacity.max(1));
        let (control_tx, control_rx) = mpsc::channel(4);
        let config = self.config.clone();

        let handle = self.runtime.spawn(async move {
            run_client(config, commands_rx, control_rx, shared).await;
        });

        self.link = Some(Link {
            commands: commands_tx,
            control: control_tx,
            handle,
        });
    }

    /// Stop the device and close the connection in the background.
    ///
    /// The status reads Disconnected as soon as this returns; the closing task
    /// no longer publishes.
    pub fn disconnect(&mut self) {
        if let Some(link) = self.link.take() {
            if !link.handle.is_finished() {
                info!("Disconnecting from Buttplug server");
                let _ = link.control.try_send(ControlRequest::Stop(StopReason::Disconnect));
                // Dropping the senders ends the client loop
            }
        }
        self.generation.fetch_add(1, Ordering::SeqCst);
        *self.status.write() = ControllerStatus::default();
    }

    /// Forward a mixer command. Returns Ok(false) when nothing was queued:
    /// the intensity queue is full, or a stop found no connection.
    pub fn send(&mut self, command: DeviceCommand) -> Result<bool> {
        match command {
            DeviceCommand::Stop => Ok(self.stop(StopReason::UserAbort)),
            DeviceCommand::Scalar(level) => {
                let link = self.link.as_ref().ok_or(ControlError::NotConnected)?;
                match link.commands.try_send(level) {
                    Ok(()) => Ok(true),
                    Err(TrySendError::Full(_)) => {
                        debug!("Device command queue full, dropping frame");
                        Ok(false)
                    }
                    Err(TrySendError::Closed(_)) => {
                        error!("Device command channel closed");
                        self.link = None;
                        Err(ControlError::ChannelClosed)
                    }
                }
            }
        }
    }

    /// Stop the device now. Jumps ahead of any queued intensity frames.
    ///
    /// Returns false when there is no client task to deliver the stop.
    pub fn stop(&mut self, reason: StopReason) -> bool {
        let Some(link) = &self.link else {
            debug!(?reason, "Stop requested with no connection");
            return false;
        };
        match link.control.try_send(ControlRequest::Stop(reason)) {
            Ok(()) => true,
            // A stop is already pending
            Err(TrySendError::Full(_)) => true,
            Err(TrySendError::Closed(_)) => {
                warn!(?reason, "Stop could not be delivered, client task has exited");
                self.link = None;
                false
            }
        }
    }

    /// Ask the server to scan for new devices
    pub fn start_scanning(&self) -> Result<()> {
        self.control(ControlRequest::StartScanning)
    }

    /// Re-fetch the device list from the server
    pub fn refresh_devices(&self) -> Result<()> {
        self.control(ControlRequest::RefreshDevices)
    }

    /// Stop the device, close the connection and wait up to `timeout` for the
    /// client task to finish.
    pub fn shutdown(&mut self, timeout: Duration) {
        let Some(link) = self.link.take() else {
            return;
        };
        let _ = link.control.try_send(ControlRequest::Stop(StopReason::Shutdown));
        let Link {
            commands,
            control,
            handle,
        } = link;
        drop(commands);
        drop(control);

        if self
            .runtime
            .block_on(async { tokio::time::timeout(timeout, handle).await })
            .is_err()
        {
            warn!("Device client did not shut down within {:?}", timeout);
        }
    }

    fn control(&self, request: ControlRequest) -> Result<()> {
        let link = self.link.as_ref().ok_or(ControlError::NotConnected)?;
        link.control.try_send(request).map_err(|e| match e {
            TrySendError::Full(_) => ControlError::Connection("Control queue full".to_string()),
            TrySendError::Closed(_) => ControlError::ChannelClosed,
        })
    }
}

/// Errors after which the connection is unusable
fn is_fatal(error: &ControlError) -> bool {
    matches!(
        error,
        ControlError::Connection(_) | ControlError::Websocket(_) | ControlError::ChannelClosed
    )
}

async fn stop_device(client: &mut ButtplugClient, reason: StopReason) -> Result<()> {
    match client.selected_device().map(|d| d.device_index) {
        Some(index) => {
            warn!(?reason, device = index, "Stopping device");
            client.stop_device(index).await
        }
        None => {
            warn!(?reason, "Stopping all devices");
            client.stop_all_devices().await
        }
    }
}

async fn send_scalar(client: &mut ButtplugClient, level: Intensity) -> Result<()> {
    let index = client
        .selected_device()
        .map(|d| d.device_index)
        .ok_or_else(|| ControlError::DeviceNotFound("No device connected".to_string()))?;
    client.scalar(index, f64::from(level.value())).await
}

/// Client task: owns the websocket for the lifetime of one connection.
async fn run_client(
    config: ControllerConfig,
    mut commands: mpsc::Receiver<Intensity>,
    mut control: mpsc::Receiver<ControlRequest>,
    shared: Shared,
) {
    let mut client = match ButtplugClient::connect_with_timeout(
        &config.address,
        &config.client_name,
        config.request_timeout,
    )
    .await
    {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to connect to Buttplug server: {}", e);
            shared.set_state(ConnectionState::Error(e.to_string()));
            return;
        }
    };

    match client.selected_device() {
        Some(device) => info!("Using device: {}", device.name()),
        None => {
            warn!("Connected but no devices found");
            if config.scan_when_empty {
                if let Err(e) = client.start_scanning().await {
                    warn!("Failed to start scanning: {}", e);
                }
            }
        }
    }
    shared.publish(&client);

    let ping_period = client.ping_interval();
    let mut ping = tokio::time::interval(ping_period.unwrap_or(Duration::from_secs(3600)));
    ping.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately
    ping.tick().await;

    let outcome: Result<()> = loop {
        tokio::select! {
            biased;

            request = control.recv() => match request {
                Some(ControlRequest::Stop(reason)) => {
                    // Frames queued before the stop must not reach the device
                    while commands.try_recv().is_ok() {}
                    if let Err(e) = stop_device(&mut client, reason).await {
                        error!("Failed to stop device: {}", e);
                        if is_fatal(&e) {
                            break Err(e);
                        }
                    }
                }
                Some(ControlRequest::StartScanning) => {
                    if let Err(e) = client.start_scanning().await {
                        warn!("Failed to start scanning: {}", e);
                    }
                    shared.publish(&client);
                }
                Some(ControlRequest::RefreshDevices) => {
                    if let Err(e) = client.request_device_list().await {
                        warn!("Failed to refresh device list: {}", e);
                    }
                    shared.publish(&client);
                }
                None => break Ok(()),
            },

            command = commands.recv() => match command {
                Some(level) => match send_scalar(&mut client, level).await {
                    Ok(()) => shared.stats.lock().record_sent(),
                    Err(e) => {
                        error!("Failed to send intensity {}: {}", level, e);
                        shared.stats.lock().record_failure();
                        shared.request_resend();
                        if is_fatal(&e) {
                            break Err(e);
                        }
                    }
                },
                None => break Ok(()),
            },

            event = client.next_event() => match event {
                Ok(Some(event)) => {
                    debug!("Server event: {}", event.kind());
                    shared.publish(&client);
                }
                Ok(None) => {
                    break Err(ControlError::Connection(
                        "Server closed the connection".to_string(),
                    ))
                }
                Err(e) => break Err(e),
            },

            _ = ping.tick(), if ping_period.is_some() => {
                if let Err(e) = client.ping().await {
                    break Err(e);
                }
            }
        }
    };

    match outcome {
        Ok(()) => {
            if let Err(e) = stop_device(&mut client, StopReason::Disconnect).await {
                warn!("Failed to stop device before disconnecting: {}", e);
            }
            if let Err(e) = client.close().await {
                warn!("Error closing websocket: {}", e);
            }
            shared.set_state(ConnectionState::Disconnected);
            info!("Disconnected from Buttplug server");
        }
        Err(e) => {
            error!("Device connection lost: {}", e);
            shared.set_state(ConnectionState::Error(e.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_text() {
        let mut status = ControllerStatus::default();
        assert_eq!(status.status_text(), "Disconnected");
        assert!(!status.can_send());

        status.state = ConnectionState::Connected;
        assert_eq!(status.status_text(), "Connected - No devices found");
        assert!(!status.can_send());

        status.device = Some(DeviceSummary {
            index: 0,
            name: "Lush 3".to_string(),
            scalar_actuators: 1,
        });
        assert_eq!(status.status_text(), "Connected to Lush 3");
        assert!(status.can_send());

        status.state = ConnectionState::Error("refused".to_string());
        assert_eq!(status.status_text(), "Connection failed: refused");
    }

    #[test]
    fn test_send_without_connection() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let mut controller =
            DeviceController::new(runtime.handle().clone(), ControllerConfig::default());
        assert!(matches!(
            controller.send(DeviceCommand::Scalar(Intensity::new(0.5))),
            Err(ControlError::NotConnected)
        ));
        // Accepted, but nothing was there to deliver it
        assert!(!controller.send(DeviceCommand::Stop).unwrap());
        assert!(!controller.take_resend_request());
        assert_eq!(controller.state(), ConnectionState::Disconnected);
    }
}
