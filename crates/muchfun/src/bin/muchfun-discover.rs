//! Lists the devices a Buttplug server knows about, with their actuators and
//! sensors. Optionally reads each sensor once.

use anyhow::{Context, Result};
use clap::Parser;
use muchfun_control::buttplug::ActuatorAttributes;
use muchfun_control::{ButtplugClient, ButtplugMessage, DeviceInfo};
use muchfun_core::{is_websocket_url, DEFAULT_SERVER_ADDRESS};
use std::time::Duration;
use tokio::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "muchfun-discover")]
#[command(about = "List devices and actuators on a Buttplug server", long_about = None)]
struct Args {
    /// Websocket address of the server
    #[arg(long, default_value = DEFAULT_SERVER_ADDRESS)]
    server: String,

    /// Scan for new devices for this many seconds before listing
    #[arg(long, value_name = "SECONDS", default_value_t = 0)]
    scan: u64,

    /// Seconds to wait for the handshake
    #[arg(long, value_name = "SECONDS", default_value_t = 5)]
    timeout: u64,

    /// Read every sensor once with SensorReadCmd
    #[arg(long)]
    read_sensors: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(tracing::level_filters::LevelFilter::WARN.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    anyhow::ensure!(
        is_websocket_url(&args.server),
        "Server address must start with ws:// or wss://: {}",
        args.server
    );

    println!("Connecting to {}...", args.server);
    let mut client = ButtplugClient::connect_with_timeout(
        &args.server,
        "MuchFun Discover",
        Duration::from_secs(args.timeout.max(1)),
    )
    .await
    .with_context(|| format!("Could not connect to {}", args.server))?;
    println!(
        "Connected to {} (protocol v{})",
        client.server_info().server_name,
        client.server_info().message_version
    );

    if args.scan > 0 {
        scan(&mut client, Duration::from_secs(args.scan)).await?;
    }

    print_devices(&client);
    if args.read_sensors {
        read_sensors(&mut client).await;
    }
    client.close().await.context("Failed to close connection")?;
    Ok(())
}

async fn scan(client: &mut ButtplugClient, duration: Duration) -> Result<()> {
    println!("Scanning for {} s...", duration.as_secs());
    client.start_scanning().await?;

    let deadline = Instant::now() + duration;
    loop {
        match tokio::time::timeout_at(deadline, client.next_event()).await {
            Err(_) => break,
            Ok(Ok(Some(ButtplugMessage::DeviceAdded(added)))) => {
                println!("  found: {}", added.device.name());
            }
            Ok(Ok(Some(_))) => {}
            Ok(Ok(None)) => anyhow::bail!("Server closed the connection while scanning"),
            Ok(Err(e)) => return Err(e.into()),
        }
    }

    client.stop_scanning().await?;
    Ok(())
}

fn print_devices(client: &ButtplugClient) {
    let selected = client.selected_device().map(|d| d.device_index);
    let mut count = 0;

    for device in client.devices() {
        count += 1;
        let marker = if Some(device.device_index) == selected {
            " (selected)"
        } else {
            ""
        };
        println!("[{}] {}{}", device.device_index, device.name(), marker);
        print_device(device);
    }

    if count == 0 {
        println!("No devices found. Try --scan 5 with the device switched on.");
    }
}

fn print_device(device: &DeviceInfo) {
    print_actuators("Scalar actuators", device.scalar_actuators());
    print_actuators("Linear actuators", device.linear_actuators());
    print_actuators("Rotatory actuators", device.rotatory_actuators());

    let sensors = device.sensors();
    println!("    Sensors: {}", sensors.len());
    for (index, sensor) in sensors.iter().enumerate() {
        let ranges: Vec<String> = sensor
            .sensor_range
            .iter()
            .map(|[min, max]| format!("{}..{}", min, max))
            .collect();
        println!(
            "      #{} {}{} range {}",
            index,
            sensor.sensor_type,
            descriptor(&sensor.feature_descriptor),
            ranges.join(", ")
        );
    }
}

fn print_actuators(label: &str, actuators: &[ActuatorAttributes]) {
    println!("    {}: {}", label, actuators.len());
    for (index, actuator) in actuators.iter().enumerate() {
        println!(
            "      #{} {}{} ({} steps)",
            index,
            actuator.actuator_type,
            descriptor(&actuator.feature_descriptor),
            actuator.step_count
        );
    }
}

fn descriptor(text: &str) -> String {
    if text.is_empty() {
        String::new()
    } else {
        format!(" \"{}\"", text)
    }
}

/// Read every sensor once. Failures are reported per sensor.
async fn read_sensors(client: &mut ButtplugClient) {
    let targets: Vec<(u32, u32, String)> = client
        .devices()
        .flat_map(|device| {
            device.sensors().iter().enumerate().map(|(index, sensor)| {
                (device.device_index, index as u32, sensor.sensor_type.clone())
            })
        })
        .collect();

    if targets.is_empty() {
        println!("No sensors to read");
        return;
    }

    for (device_index, sensor_index, sensor_type) in targets {
        match client.read_sensor(device_index, sensor_index).await {
            Ok(reading) => println!(
                "[{}] sensor #{} {}: {:?}",
                device_index, sensor_index, sensor_type, reading.data
            ),
            Err(e) => println!(
                "[{}] sensor #{} {}: read failed: {}",
                device_index, sensor_index, sensor_type, e
            ),
        }
    }
}
