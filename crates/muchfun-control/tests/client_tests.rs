use futures::{SinkExt, StreamExt};
use muchfun_control::buttplug::messages::{
    decode, encode, ActuatorAttributes, ButtplugMessage, DeviceAdded, DeviceInfo, DeviceList,
    DeviceMessages, ErrorMessage, MessageId, SensorAttributes, SensorReading, ServerInfo,
};
use muchfun_control::{
    ButtplugClient, ConnectionState, ControlError, ControllerConfig, DeviceController,
};
use muchfun_core::{DeviceCommand, Intensity};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_async, WebSocketStream};

fn test_device(index: u32, name: &str) -> DeviceInfo {
    let vibrate = ActuatorAttributes {
        feature_descriptor: String::new(),
        step_count: 20,
        actuator_type: "Vibrate".to_string(),
    };
    DeviceInfo {
        device_name: name.to_string(),
        device_index: index,
        device_display_name: None,
        device_message_timing_gap: Some(100),
        device_messages: DeviceMessages {
            scalar_cmd: vec![vibrate.clone(), vibrate],
            sensor_read_cmd: vec![SensorAttributes {
                feature_descriptor: "Battery Level".to_string(),
                sensor_type: "Battery".to_string(),
                sensor_range: vec![[0, 100]],
            }],
            stop_device_cmd: Some(serde_json::json!({})),
            ..Default::default()
        },
    }
}

/// In-process Buttplug server that records every request
struct MockServer {
    url: String,
    received: Arc<Mutex<Vec<ButtplugMessage>>>,
}

impl MockServer {
    async fn start(devices: Vec<DeviceInfo>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let received = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&received);

        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let ws = accept_async(stream).await.unwrap();
                tokio::spawn(serve(ws, devices.clone(), Arc::clone(&log)));
            }
        });

        Self {
            url: format!("ws://{}", addr),
            received,
        }
    }

    fn received_kinds(&self) -> Vec<String> {
        self.received
            .lock()
            .iter()
            .map(|m| m.kind().to_string())
            .collect()
    }

    fn received_of(&self, kind: &str) -> Vec<ButtplugMessage> {
        self.received
            .lock()
            .iter()
            .filter(|m| m.kind() == kind)
            .cloned()
            .collect()
    }
}

async fn serve(
    mut ws: WebSocketStream<TcpStream>,
    devices: Vec<DeviceInfo>,
    log: Arc<Mutex<Vec<ButtplugMessage>>>,
) {
    while let Some(Ok(frame)) = ws.next().await {
        let Message::Text(text) = frame else {
            continue;
        };
        for request in decode(text.as_str()).unwrap() {
            log.lock().push(request.clone());
            let id = request.id();
            let ok = ButtplugMessage::Ok(MessageId { id });

            let replies = match request {
                ButtplugMessage::RequestServerInfo(_) => {
                    vec![ButtplugMessage::ServerInfo(ServerInfo {
                        id,
                        server_name: "Mock Server".to_string(),
                        message_version: 3,
                        max_ping_time: 0,
                    })]
                }
                ButtplugMessage::RequestDeviceList(_) => {
                    vec![ButtplugMessage::DeviceList(DeviceList {
                        id,
                        devices: devices.clone(),
                    })]
                }
                ButtplugMessage::StartScanning(_) => vec![
                    ok,
                    ButtplugMessage::DeviceAdded(DeviceAdded {
                        id: 0,
                        device: test_device(7, "Found While Scanning"),
                    }),
                ],
                ButtplugMessage::StopDeviceCmd(cmd)
                    if !devices.iter().any(|d| d.device_index == cmd.device_index) =>
                {
                    vec![ButtplugMessage::Error(ErrorMessage {
                        id,
                        error_message: format!("Device index {} does not exist", cmd.device_index),
                        error_code: 4,
                    })]
                }
                ButtplugMessage::SensorReadCmd(cmd) => {
                    vec![ButtplugMessage::SensorReading(SensorReading {
                        id,
                        device_index: cmd.device_index,
                        sensor_index: cmd.sensor_index,
                        sensor_type: cmd.sensor_type,
                        data: vec![87],
                    })]
                }
                _ => vec![ok],
            };

            for reply in replies {
                let text = encode(&[reply]).unwrap();
                if ws.send(Message::Text(text.into())).await.is_err() {
                    return;
                }
            }
        }
    }
}

async fn wait_for<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let start = Instant::now();
    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

#[tokio::test]
async fn test_handshake_and_device_list() {
    let server = MockServer::start(vec![test_device(0, "Test Vibrator")]).await;
    let client = ButtplugClient::connect(&server.url, "MuchFun Controller")
        .await
        .unwrap();

    assert_eq!(client.server_info().server_name, "Mock Server");
    assert_eq!(client.devices().count(), 1);
    assert_eq!(client.selected_device().unwrap().name(), "Test Vibrator");
    assert!(client.ping_interval().is_none());

    match &server.received_of("RequestServerInfo")[0] {
        ButtplugMessage::RequestServerInfo(req) => {
            assert_eq!(req.client_name, "MuchFun Controller");
            assert_eq!(req.message_version, 3);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test]
async fn test_scalar_reaches_every_actuator() {
    let server = MockServer::start(vec![test_device(0, "Test Vibrator")]).await;
    let mut client = ButtplugClient::connect(&server.url, "MuchFun Controller")
        .await
        .unwrap();

    client.scalar(0, 0.25).await.unwrap();

    let sent = server.received_of("ScalarCmd");
    let ButtplugMessage::ScalarCmd(cmd) = &sent[0] else {
        panic!("expected ScalarCmd");
    };
    assert_eq!(cmd.device_index, 0);
    assert_eq!(cmd.scalars.len(), 2);
    assert!(cmd.scalars.iter().all(|s| s.scalar == 0.25));
}

#[tokio::test]
async fn test_unknown_device_is_rejected_locally() {
    let server = MockServer::start(vec![test_device(0, "Test Vibrator")]).await;
    let mut client = ButtplugClient::connect(&server.url, "MuchFun Controller")
        .await
        .unwrap();

    assert!(matches!(
        client.scalar(3, 0.5).await,
        Err(ControlError::DeviceNotFound(_))
    ));
    assert!(server.received_of("ScalarCmd").is_empty());
}

#[tokio::test]
async fn test_read_battery_sensor() {
    let server = MockServer::start(vec![test_device(0, "Test Vibrator")]).await;
    let mut client = ButtplugClient::connect(&server.url, "MuchFun Controller")
        .await
        .unwrap();

    let reading = client.read_sensor(0, 0).await.unwrap();
    assert_eq!(reading.sensor_type, "Battery");
    assert_eq!(reading.data, vec![87]);

    // Out-of-range sensors never reach the server
    assert!(matches!(
        client.read_sensor(0, 3).await,
        Err(ControlError::DeviceNotFound(_))
    ));
    assert_eq!(server.received_of("SensorReadCmd").len(), 1);
}

#[tokio::test]
async fn test_server_error_surfaces() {
    let server = MockServer::start(vec![test_device(0, "Test Vibrator")]).await;
    let mut client = ButtplugClient::connect(&server.url, "MuchFun Controller")
        .await
        .unwrap();

    match client.stop_device(9).await {
        Err(ControlError::Server { code, message }) => {
            assert_eq!(code, 4);
            assert!(message.contains("does not exist"));
        }
        other => panic!("expected server error, got {:?}", other),
    }
    // The connection is still usable afterwards
    client.stop_device(0).await.unwrap();
}

#[tokio::test]
async fn test_scanning_picks_up_new_device() {
    let server = MockServer::start(Vec::new()).await;
    let mut client = ButtplugClient::connect(&server.url, "MuchFun Controller")
        .await
        .unwrap();
    assert!(client.selected_device().is_none());

    client.start_scanning().await.unwrap();
    let event = tokio::time::timeout(Duration::from_secs(2), client.next_event())
        .await
        .unwrap()
        .unwrap()
        .unwrap();

    assert_eq!(event.kind(), "DeviceAdded");
    assert_eq!(client.selected_device().unwrap().device_index, 7);
}

#[tokio::test]
async fn test_connect_refused() {
    // Grab a free port and release it again
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let result = ButtplugClient::connect(&format!("ws://{}", addr), "MuchFun Controller").await;
    assert!(matches!(result, Err(ControlError::Connection(_))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_controller_forwards_commands() {
    let server = MockServer::start(vec![test_device(0, "Test Vibrator")]).await;
    let mut controller = DeviceController::new(
        tokio::runtime::Handle::current(),
        ControllerConfig {
            address: server.url.clone(),
            ..ControllerConfig::default()
        },
    );

    controller.connect();
    assert!(wait_for(Duration::from_secs(3), || controller.can_send()).await);
    assert_eq!(controller.status().status_text(), "Connected to Test Vibrator");

    assert!(controller
        .send(DeviceCommand::Scalar(Intensity::new(0.5)))
        .unwrap());
    assert!(wait_for(Duration::from_secs(3), || !server.received_of("ScalarCmd").is_empty()).await);
    assert!(wait_for(Duration::from_secs(3), || controller.stats().total() == 1).await);

    assert!(controller.send(DeviceCommand::Stop).unwrap());
    assert!(
        wait_for(Duration::from_secs(3), || !server.received_of("StopDeviceCmd").is_empty()).await
    );

    controller.disconnect();
    assert!(
        wait_for(Duration::from_secs(3), || controller.state()
            == ConnectionState::Disconnected)
        .await
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stop_jumps_queued_frames() {
    let server = MockServer::start(vec![test_device(0, "Test Vibrator")]).await;
    let mut controller = DeviceController::new(
        tokio::runtime::Handle::current(),
        ControllerConfig {
            address: server.url.clone(),
            ..ControllerConfig::default()
        },
    );
    controller.connect();
    assert!(wait_for(Duration::from_secs(3), || controller.can_send()).await);

    for step in 1..=8 {
        controller
            .send(DeviceCommand::Scalar(Intensity::new(step as f32 / 10.0)))
            .unwrap();
    }
    assert!(controller.send(DeviceCommand::Stop).unwrap());

    assert!(
        wait_for(Duration::from_secs(3), || !server.received_of("StopDeviceCmd").is_empty()).await
    );
    // Give any frame left in the queue a chance to show up
    tokio::time::sleep(Duration::from_millis(200)).await;

    let kinds = server.received_kinds();
    let stop_at = kinds.iter().position(|k| k == "StopDeviceCmd").unwrap();
    assert!(
        !kinds[stop_at..].iter().any(|k| k == "ScalarCmd"),
        "intensity sent after stop: {:?}",
        kinds
    );

    controller.disconnect();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_disconnect_is_visible_immediately() {
    let server = MockServer::start(vec![test_device(0, "Test Vibrator")]).await;
    let mut controller = DeviceController::new(
        tokio::runtime::Handle::current(),
        ControllerConfig {
            address: server.url.clone(),
            ..ControllerConfig::default()
        },
    );
    controller.connect();
    assert!(wait_for(Duration::from_secs(3), || controller.can_send()).await);

    controller.disconnect();
    assert_eq!(controller.state(), ConnectionState::Disconnected);
    assert!(!controller.can_send());
    assert!(!controller.send(DeviceCommand::Stop).unwrap());

    // The closing task still stops the device, but no longer reports Connected
    assert!(
        wait_for(Duration::from_secs(3), || !server.received_of("StopDeviceCmd").is_empty()).await
    );
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(controller.state(), ConnectionState::Disconnected);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_controller_reports_connection_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let mut controller = DeviceController::new(
        tokio::runtime::Handle::current(),
        ControllerConfig {
            address: format!("ws://{}", addr),
            ..ControllerConfig::default()
        },
    );
    controller.connect();

    assert!(
        wait_for(Duration::from_secs(3), || matches!(
            controller.state(),
            ConnectionState::Error(_)
        ))
        .await
    );
    assert!(!controller.can_send());
    assert!(controller.status().status_text().starts_with("Connection failed"));
}
