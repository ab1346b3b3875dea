//! BLE control tool for Govee H613B bulbs
//!
//! Finds a bulb by name or address and drives it through a session.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use govee_ble_controller::btle::{self, BtleTransport};
use govee_ble_controller::{GoveeInstance, LightState, SessionConfig};

#[derive(Parser)]
#[command(name = "govee-ble")]
#[command(about = "BLE control tool for Govee H613B bulbs")]
struct Cli {
    /// Device name or address to connect to (default: first H613B found)
    #[arg(short, long, global = true)]
    device: Option<String>,
    /// Scan duration in seconds when looking for the device
    #[arg(short, long, global = true, default_value = "5")]
    scan: u64,
    /// Session configuration file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Debug logging for the session
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan for bulbs
    Scan,
    /// Turn the bulb on
    On,
    /// Turn the bulb off
    Off,
    /// Set a colour, as hex (ff0000 or #ff0000)
    Color { hex: String },
    /// Set brightness in percent (0-100)
    Brightness { percent: u8 },
    /// White mode, 0 (warm) to 255 (cool)
    White { intensity: u8 },
    /// Query and print the bulb's state
    Status,
    /// Run through every command once
    Demo,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut logger = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if cli.verbose {
        logger.filter_module("govee_ble_controller", log::LevelFilter::Debug);
        logger.filter_module("govee_proto", log::LevelFilter::Debug);
    }
    logger.init();

    let config = match &cli.config {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::default(),
    };
    let scan = Duration::from_secs(cli.scan);

    let command = match cli.command {
        Commands::Scan => return scan_devices(scan).await,
        command => command,
    };

    println!("Scanning for bulbs...");
    let light = btle::open(cli.device.as_deref(), scan, config).await?;
    println!("Found device: {} ({})", light.name(), light.address());

    match command {
        Commands::Scan => {}
        Commands::On => light.turn_on().await?,
        Commands::Off => light.turn_off().await?,
        Commands::Color { hex } => {
            let (r, g, b) = parse_hex(&hex)?;
            light.set_color(r, g, b).await?;
        }
        Commands::Brightness { percent } => light.set_brightness_percent(percent).await?,
        Commands::White { intensity } => light.set_white(intensity).await?,
        Commands::Status => status(&light).await?,
        Commands::Demo => demo(&light).await?,
    }

    light.disconnect().await?;
    Ok(())
}

async fn scan_devices(duration: Duration) -> Result<(), Box<dyn std::error::Error>> {
    println!("Scanning for bulbs ({} seconds)...", duration.as_secs());

    let adapter = btle::get_adapter().await?;
    let devices = btle::scan(&adapter, duration).await?;

    println!("\nFound {} devices:", devices.len());
    for device in devices {
        let rssi = device
            .rssi
            .map(|r| format!("{} dBm", r))
            .unwrap_or_else(|| "N/A".to_string());
        let marker = if device.is_govee { " [H613B]" } else { "" };
        println!("  {} ({}) RSSI: {}{}", device.name, device.address, rssi, marker);
    }
    Ok(())
}

async fn status(light: &GoveeInstance<BtleTransport>) -> Result<(), Box<dyn std::error::Error>> {
    light.update().await?;
    // Reports arrive as notifications shortly after the queries
    tokio::time::sleep(Duration::from_secs(1)).await;
    print_state(&light.state());
    Ok(())
}

async fn demo(light: &GoveeInstance<BtleTransport>) -> Result<(), Box<dyn std::error::Error>> {
    let delay = Duration::from_secs(1);
    light.register_callback(print_state);

    light.turn_on().await?;
    light.update().await?;
    tokio::time::sleep(delay).await;

    for intensity in [100, 1] {
        light.set_white(intensity).await?;
        light.update().await?;
        tokio::time::sleep(delay).await;
    }

    light.set_brightness(100).await?;
    for (r, g, b) in [(0, 0, 255), (255, 0, 0), (0, 255, 0)] {
        light.set_color(r, g, b).await?;
        light.update().await?;
        tokio::time::sleep(delay).await;
    }

    light.set_brightness(1).await?;
    light.update().await?;
    tokio::time::sleep(delay).await;

    light.turn_off().await?;
    light.update().await?;
    tokio::time::sleep(delay).await;
    Ok(())
}

fn print_state(state: &LightState) {
    println!(
        "power: {}, mode: {:?}, rgb: {:?}, white: {}, brightness: {}",
        if state.power { "on" } else { "off" },
        state.mode,
        state.rgb,
        state.white_index,
        state.brightness
    );
}

fn parse_hex(s: &str) -> Result<(u8, u8, u8), String> {
    let digits = s.trim_start_matches('#');
    if digits.len() != 6 || !digits.is_ascii() {
        return Err(format!("expected a colour like ff8800, got {s:?}"));
    }
    let channel = |i: usize| {
        u8::from_str_radix(&digits[i..i + 2], 16)
            .map_err(|_| format!("invalid hex digits in {s:?}"))
    };
    Ok((channel(0)?, channel(2)?, channel(4)?))
}
