//! Buttplug protocol v3 message model
//!
//! Every frame on the wire is a JSON array of messages, each message an
//! object with a single key naming its type:
//!
//! ```json
//! [{"ScalarCmd": {"Id": 4, "DeviceIndex": 0, "Scalars": [...]}}]
//! ```
//!
//! Client-assigned ids start at 1. Server events (device added/removed,
//! scanning finished) carry id 0.

use crate::error::{ControlError, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Protocol version announced in the handshake
pub const MESSAGE_VERSION: u32 = 3;

/// Id used by the server for unsolicited events
pub const EVENT_ID: u32 = 0;

/// Message with nothing but an id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MessageId {
    pub id: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RequestServerInfo {
    pub id: u32,
    pub client_name: String,
    pub message_version: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServerInfo {
    pub id: u32,
    #[serde(default)]
    pub server_name: String,
    pub message_version: u32,
    /// Milliseconds; 0 disables the ping requirement
    #[serde(default)]
    pub max_ping_time: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ErrorMessage {
    pub id: u32,
    pub error_message: String,
    pub error_code: i64,
}

/// Attributes of one actuator feature (`ScalarCmd`, `LinearCmd`, `RotateCmd`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
pub struct ActuatorAttributes {
    pub feature_descriptor: String,
    pub step_count: u32,
    /// Vibrate, Rotate, Oscillate, Constrict, Inflate, Position...
    pub actuator_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
pub struct SensorAttributes {
    pub feature_descriptor: String,
    pub sensor_type: String,
    pub sensor_range: Vec<[i32; 2]>,
}

/// Messages a device accepts, with their feature lists.
/// Message types this client never sends are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DeviceMessages {
    #[serde(rename = "ScalarCmd", default, skip_serializing_if = "Vec::is_empty")]
    pub scalar_cmd: Vec<ActuatorAttributes>,
    #[serde(rename = "LinearCmd", default, skip_serializing_if = "Vec::is_empty")]
    pub linear_cmd: Vec<ActuatorAttributes>,
    #[serde(rename = "RotateCmd", default, skip_serializing_if = "Vec::is_empty")]
    pub rotate_cmd: Vec<ActuatorAttributes>,
    #[serde(rename = "SensorReadCmd", default, skip_serializing_if = "Vec::is_empty")]
    pub sensor_read_cmd: Vec<SensorAttributes>,
    #[serde(
        rename = "StopDeviceCmd",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub stop_device_cmd: Option<serde_json::Value>,
}

/// A device as described by `DeviceList` and `DeviceAdded`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeviceInfo {
    pub device_name: String,
    pub device_index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_message_timing_gap: Option<u32>,
    #[serde(default)]
    pub device_messages: DeviceMessages,
}

impl DeviceInfo {
    /// Display name if the user set one, else the device name
    pub fn name(&self) -> &str {
        self.device_display_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.device_name)
    }

    pub fn scalar_actuators(&self) -> &[ActuatorAttributes] {
        &self.device_messages.scalar_cmd
    }

    pub fn has_scalar_actuators(&self) -> bool {
        !self.device_messages.scalar_cmd.is_empty()
    }

    pub fn linear_actuators(&self) -> &[ActuatorAttributes] {
        &self.device_messages.linear_cmd
    }

    pub fn rotatory_actuators(&self) -> &[ActuatorAttributes] {
        &self.device_messages.rotate_cmd
    }

    /// Sensors readable with `SensorReadCmd`, in sensor index order
    pub fn sensors(&self) -> &[SensorAttributes] {
        &self.device_messages.sensor_read_cmd
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeviceList {
    pub id: u32,
    #[serde(default)]
    pub devices: Vec<DeviceInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceAdded {
    #[serde(rename = "Id")]
    pub id: u32,
    #[serde(flatten)]
    pub device: DeviceInfo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeviceRemoved {
    pub id: u32,
    pub device_index: u32,
}

/// One actuator level inside a `ScalarCmd`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ScalarSubcommand {
    pub index: u32,
    /// 0.0 - 1.0
    pub scalar: f64,
    pub actuator_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ScalarCmd {
    pub id: u32,
    pub device_index: u32,
    pub scalars: Vec<ScalarSubcommand>,
}

impl ScalarCmd {
    /// Drive every scalar actuator of `device` to `level`
    pub fn for_all_actuators(device: &DeviceInfo, level: f64) -> Self {
        let scalar = if level.is_finite() {
            level.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            id: 0,
            device_index: device.device_index,
            scalars: device
                .scalar_actuators()
                .iter()
                .enumerate()
                .map(|(index, actuator)| ScalarSubcommand {
                    index: index as u32,
                    scalar,
                    actuator_type: actuator.actuator_type.clone(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StopDeviceCmd {
    pub id: u32,
    pub device_index: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SensorReadCmd {
    pub id: u32,
    pub device_index: u32,
    pub sensor_index: u32,
    pub sensor_type: String,
}

/// Reply to `SensorReadCmd`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SensorReading {
    pub id: u32,
    pub device_index: u32,
    pub sensor_index: u32,
    pub sensor_type: String,
    #[serde(default)]
    pub data: Vec<i32>,
}

/// All messages this client sends or understands
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ButtplugMessage {
    // Handshake & status
    RequestServerInfo(RequestServerInfo),
    ServerInfo(ServerInfo),
    Ok(MessageId),
    Error(ErrorMessage),
    Ping(MessageId),

    // Enumeration
    StartScanning(MessageId),
    StopScanning(MessageId),
    ScanningFinished(MessageId),
    RequestDeviceList(MessageId),
    DeviceList(DeviceList),
    DeviceAdded(DeviceAdded),
    DeviceRemoved(DeviceRemoved),

    // Device commands
    ScalarCmd(ScalarCmd),
    StopDeviceCmd(StopDeviceCmd),
    StopAllDevices(MessageId),

    // Sensors
    SensorReadCmd(SensorReadCmd),
    SensorReading(SensorReading),
}

impl ButtplugMessage {
    pub fn id(&self) -> u32 {
        match self {
            Self::RequestServerInfo(m) => m.id,
            Self::ServerInfo(m) => m.id,
            Self::Error(m) => m.id,
            Self::DeviceList(m) => m.id,
            Self::DeviceAdded(m) => m.id,
            Self::DeviceRemoved(m) => m.id,
            Self::ScalarCmd(m) => m.id,
            Self::StopDeviceCmd(m) => m.id,
            Self::SensorReadCmd(m) => m.id,
            Self::SensorReading(m) => m.id,
            Self::Ok(m)
            | Self::Ping(m)
            | Self::StartScanning(m)
            | Self::StopScanning(m)
            | Self::ScanningFinished(m)
            | Self::RequestDeviceList(m)
            | Self::StopAllDevices(m) => m.id,
        }
    }

    pub fn set_id(&mut self, id: u32) {
        match self {
            Self::RequestServerInfo(m) => m.id = id,
            Self::ServerInfo(m) => m.id = id,
            Self::Error(m) => m.id = id,
            Self::DeviceList(m) => m.id = id,
            Self::DeviceAdded(m) => m.id = id,
            Self::DeviceRemoved(m) => m.id = id,
            Self::ScalarCmd(m) => m.id = id,
            Self::StopDeviceCmd(m) => m.id = id,
            Self::SensorReadCmd(m) => m.id = id,
            Self::SensorReading(m) => m.id = id,
            Self::Ok(m)
            | Self::Ping(m)
            | Self::StartScanning(m)
            | Self::StopScanning(m)
            | Self::ScanningFinished(m)
            | Self::RequestDeviceList(m)
            | Self::StopAllDevices(m) => m.id = id,
        }
    }

    /// Message type name as it appears on the wire
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RequestServerInfo(_) => "RequestServerInfo",
            Self::ServerInfo(_) => "ServerInfo",
            Self::Ok(_) => "Ok",
            Self::Error(_) => "Error",
            Self::Ping(_) => "Ping",
            Self::StartScanning(_) => "StartScanning",
            Self::StopScanning(_) => "StopScanning",
            Self::ScanningFinished(_) => "ScanningFinished",
            Self::RequestDeviceList(_) => "RequestDeviceList",
            Self::DeviceList(_) => "DeviceList",
            Self::DeviceAdded(_) => "DeviceAdded",
            Self::DeviceRemoved(_) => "DeviceRemoved",
            Self::ScalarCmd(_) => "ScalarCmd",
            Self::StopDeviceCmd(_) => "StopDeviceCmd",
            Self::StopAllDevices(_) => "StopAllDevices",
            Self::SensorReadCmd(_) => "SensorReadCmd",
            Self::SensorReading(_) => "SensorReading",
        }
    }

    /// Server-initiated message (not a reply)
    pub fn is_event(&self) -> bool {
        self.id() == EVENT_ID
    }

    pub fn request_server_info(client_name: &str) -> Self {
        Self::RequestServerInfo(RequestServerInfo {
            id: 0,
            client_name: client_name.to_string(),
            message_version: MESSAGE_VERSION,
        })
    }

    pub fn request_device_list() -> Self {
        Self::RequestDeviceList(MessageId { id: 0 })
    }

    pub fn start_scanning() -> Self {
        Self::StartScanning(MessageId { id: 0 })
    }

    pub fn stop_scanning() -> Self {
        Self::StopScanning(MessageId { id: 0 })
    }

    pub fn ping() -> Self {
        Self::Ping(MessageId { id: 0 })
    }

    pub fn stop_device(device_index: u32) -> Self {
        Self::StopDeviceCmd(StopDeviceCmd {
            id: 0,
            device_index,
        })
    }

    pub fn stop_all_devices() -> Self {
        Self::StopAllDevices(MessageId { id: 0 })
    }

    pub fn sensor_read(device_index: u32, sensor_index: u32, sensor_type: &str) -> Self {
        Self::SensorReadCmd(SensorReadCmd {
            id: 0,
            device_index,
            sensor_index,
            sensor_type: sensor_type.to_string(),
        })
    }
}

/// Serialize messages into one wire frame
pub fn encode(messages: &[ButtplugMessage]) -> Result<String> {
    Ok(serde_json::to_string(messages)?)
}

/// Parse a wire frame.
///
/// The frame must be a JSON array. Entries of unknown type are logged and
/// skipped so newer servers do not break the client.
pub fn decode(text: &str) -> Result<Vec<ButtplugMessage>> {
    let raw: Vec<serde_json::Value> = serde_json::from_str(text)
        .map_err(|e| ControlError::Protocol(format!("Frame is not a message array: {}", e)))?;

    Ok(raw
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<ButtplugMessage>(value.clone()) {
            Ok(message) => Some(message),
            Err(e) => {
                warn!("Skipping unsupported message {}: {}", value, e);
                None
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEVICE_JSON: &str = r#"{
        "DeviceName": "Test Vibrator",
        "DeviceIndex": 2,
        "DeviceMessageTimingGap": 100,
        "DeviceDisplayName": "",
        "DeviceMessages": {
            "ScalarCmd": [
                {"StepCount": 20, "FeatureDescriptor": "Clitoral Stimulator", "ActuatorType": "Vibrate"},
                {"StepCount": 20, "FeatureDescriptor": "Insertable Vibrator", "ActuatorType": "Vibrate"}
            ],
            "StopDeviceCmd": {},
            "SensorReadCmd": [
                {"FeatureDescriptor": "Battery Level", "SensorType": "Battery", "SensorRange": [[0, 100]]}
            ]
        }
    }"#;

    #[test]
    fn test_handshake_wire_shape() {
        let mut msg = ButtplugMessage::request_server_info("MuchFun Controller");
        msg.set_id(1);
        assert_eq!(
            encode(&[msg]).unwrap(),
            r#"[{"RequestServerInfo":{"Id":1,"ClientName":"MuchFun Controller","MessageVersion":3}}]"#
        );
    }

    #[test]
    fn test_parse_server_info() {
        let frame = r#"[{"ServerInfo":{"Id":1,"ServerName":"Intiface Server","MessageVersion":3,"MaxPingTime":0}}]"#;
        let messages = decode(frame).unwrap();
        assert_eq!(
            messages,
            vec![ButtplugMessage::ServerInfo(ServerInfo {
                id: 1,
                server_name: "Intiface Server".to_string(),
                message_version: 3,
                max_ping_time: 0,
            })]
        );
    }

    #[test]
    fn test_parse_error_reply() {
        let frame =
            r#"[{"Error":{"Id":5,"ErrorMessage":"Device index 9 does not exist","ErrorCode":4}}]"#;
        match &decode(frame).unwrap()[0] {
            ButtplugMessage::Error(e) => {
                assert_eq!(e.id, 5);
                assert_eq!(e.error_code, 4);
                assert!(e.error_message.contains("does not exist"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_device_added_event() {
        let frame = r#"[{"DeviceAdded":{"Id":0,"DeviceName":"Test Vibrator","DeviceIndex":2,
            "DeviceDisplayName":"","DeviceMessages":{
                "ScalarCmd":[{"StepCount":20,"FeatureDescriptor":"","ActuatorType":"Vibrate"},
                             {"StepCount":10,"FeatureDescriptor":"","ActuatorType":"Rotate"}],
                "SensorReadCmd":[{"FeatureDescriptor":"Battery Level","SensorType":"Battery","SensorRange":[[0,100]]}],
                "StopDeviceCmd":{}}}}]"#;
        let messages = decode(frame).unwrap();
        let ButtplugMessage::DeviceAdded(added) = &messages[0] else {
            panic!("expected DeviceAdded, got {:?}", messages);
        };
        assert!(messages[0].is_event());
        assert_eq!(added.device.device_index, 2);
        assert_eq!(added.device.name(), "Test Vibrator");
        assert_eq!(added.device.scalar_actuators().len(), 2);
        assert_eq!(
            added.device.device_messages.sensor_read_cmd[0].sensor_range,
            vec![[0, 100]]
        );
        assert!(added.device.device_messages.stop_device_cmd.is_some());
    }

    #[test]
    fn test_scalar_cmd_covers_every_actuator() {
        let device: DeviceInfo = serde_json::from_str(DEVICE_JSON).unwrap();
        let mut msg = ButtplugMessage::ScalarCmd(ScalarCmd::for_all_actuators(&device, 0.5));
        msg.set_id(7);
        assert_eq!(
            encode(&[msg]).unwrap(),
            r#"[{"ScalarCmd":{"Id":7,"DeviceIndex":2,"Scalars":[{"Index":0,"Scalar":0.5,"ActuatorType":"Vibrate"},{"Index":1,"Scalar":0.5,"ActuatorType":"Vibrate"}]}}]"#
        );
    }

    #[test]
    fn test_scalar_is_clamped() {
        let device: DeviceInfo = serde_json::from_str(DEVICE_JSON).unwrap();
        let cmd = ScalarCmd::for_all_actuators(&device, 3.0);
        assert!(cmd.scalars.iter().all(|s| s.scalar == 1.0));
        let cmd = ScalarCmd::for_all_actuators(&device, f64::NAN);
        assert!(cmd.scalars.iter().all(|s| s.scalar == 0.0));
    }

    #[test]
    fn test_unknown_messages_are_skipped() {
        let frame = r#"[{"SensorReading":{"Id":0,"DeviceIndex":0}},{"Ok":{"Id":3}}]"#;
        assert_eq!(
            decode(frame).unwrap(),
            vec![ButtplugMessage::Ok(MessageId { id: 3 })]
        );
    }

    #[test]
    fn test_non_array_frame_is_protocol_error() {
        assert!(matches!(
            decode(r#"{"Ok":{"Id":1}}"#),
            Err(ControlError::Protocol(_))
        ));
    }

    #[test]
    fn test_sensor_read_wire_shape() {
        let mut msg = ButtplugMessage::sensor_read(2, 0, "Battery");
        msg.set_id(5);
        assert_eq!(
            encode(&[msg]).unwrap(),
            r#"[{"SensorReadCmd":{"Id":5,"DeviceIndex":2,"SensorIndex":0,"SensorType":"Battery"}}]"#
        );

        let frame = r#"[{"SensorReading":{"Id":5,"DeviceIndex":2,"SensorIndex":0,
            "SensorType":"Battery","Data":[87]}}]"#;
        let ButtplugMessage::SensorReading(reading) = &decode(frame).unwrap()[0] else {
            panic!("expected SensorReading");
        };
        assert_eq!(reading.data, vec![87]);

        let device: DeviceInfo = serde_json::from_str(DEVICE_JSON).unwrap();
        assert_eq!(device.sensors()[0].sensor_type, "Battery");
        assert!(device.linear_actuators().is_empty());
        assert!(device.rotatory_actuators().is_empty());
    }
}
