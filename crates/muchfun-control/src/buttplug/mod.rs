//! Buttplug protocol v3 over websocket

pub mod client;
pub mod messages;

pub use client::{ButtplugClient, DEFAULT_REQUEST_TIMEOUT};
pub use messages::{
    ActuatorAttributes, ButtplugMessage, DeviceInfo, DeviceMessages, ScalarCmd, SensorAttributes,
    SensorReading, ServerInfo,
};
