//! MuchFun Control - Device Client
//!
//! Connects MuchFun to a Buttplug server (e.g. Intiface Central):
//! - [`buttplug`] - protocol v3 message model and websocket client
//! - [`controller`] - connection state and the command path used by the GUI
//! - [`error`] - error types
//!
//! ```rust,no_run
//! use muchfun_control::{ControllerConfig, DeviceController};
//! use muchfun_core::{DeviceCommand, Intensity};
//!
//! let runtime = tokio::runtime::Runtime::new().unwrap();
//! let mut controller =
//!     DeviceController::new(runtime.handle().clone(), ControllerConfig::default());
//! controller.connect();
//! // ...once connected
//! let _ = controller.send(DeviceCommand::Scalar(Intensity::new(0.4)));
//! ```

/// Buttplug protocol and client
pub mod buttplug;
/// Connection ownership and command forwarding
pub mod controller;
/// Error types
pub mod error;

// Re-exports
pub use buttplug::{ButtplugClient, ButtplugMessage, DeviceInfo};
pub use controller::{
    ConnectionState, ControllerConfig, ControllerStatus, DeviceController, DeviceSummary,
    StopReason,
};
pub use error::{ControlError, Result};
