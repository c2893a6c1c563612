//! Desktop WiThrottle client.
//!
//! Connects to a server over TCP, logs everything the server reports, and
//! optionally acquires a locomotive and sets its speed.
//!
//! ```bash
//! cargo run --features cli --bin wit_client -- --host 192.168.1.20 --loco L3 --speed 20 -v
//! ```

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};

use rs_withrottle::hal::{SystemClock, TcpTransport};
use rs_withrottle::traits::Clock;
use rs_withrottle::{
    Config, Delegate, Direction, ListEntry, RosterEntry, RouteState, SpeedSteps, ThrottleId,
    TrackPower, TurnoutState, WiThrottle,
};

/// Main loop interval in milliseconds
const LOOP_INTERVAL_MS: u64 = 10;

#[derive(Parser)]
#[command(name = "wit_client")]
#[command(about = "Minimal WiThrottle client for JMRI / DCC-EX / LnWi servers")]
#[command(version)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Server host (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// Server port (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Device name announced to the server (overrides config)
    #[arg(short, long)]
    name: Option<String>,

    /// Locomotive to acquire, e.g. L1234 or S3
    #[arg(short, long)]
    loco: Option<String>,

    /// Throttle id to use: T or 0-5
    #[arg(short, long, default_value_t = 'T')]
    throttle: char,

    /// Speed to set after acquiring (0-126)
    #[arg(short, long)]
    speed: Option<i32>,

    /// Run in reverse
    #[arg(short, long)]
    reverse: bool,

    /// Seconds to stay connected (0 = until the connection drops)
    #[arg(short, long, default_value_t = 0)]
    duration: u64,

    /// Verbose logging (-v debug, -vv wire trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?
        }
        None => Config::default(),
    };
    if let Some(host) = &cli.host {
        config.server = config.server.with_host(host);
    }
    if let Some(port) = cli.port {
        config.server = config.server.with_port(port);
    }
    if let Some(name) = &cli.name {
        config.protocol = config.protocol.with_device_name(name);
    }
    if config.protocol.device_name.is_empty() {
        config.protocol = config.protocol.with_device_name("wit_client");
    }
    Ok(config)
}

/// Logs every server event.
struct LoggingDelegate;

impl Delegate for LoggingDelegate {
    fn received_version(&mut self, version: &str) {
        info!("protocol version {version}");
    }
    fn received_server_type(&mut self, server_type: &str) {
        info!("server type {server_type}");
    }
    fn received_server_description(&mut self, description: &str) {
        info!("server: {description}");
    }
    fn received_message(&mut self, message: &str) {
        info!("message: {message}");
    }
    fn received_alert(&mut self, alert: &str) {
        warn!("alert: {alert}");
    }
    fn received_web_port(&mut self, port: i32) {
        info!("web server on port {port}");
    }
    fn received_track_power(&mut self, state: TrackPower) {
        info!("track power {state:?}");
    }
    fn heartbeat_config(&mut self, period_secs: u32) {
        info!("heartbeat required every {period_secs}s");
    }
    fn fast_time_changed(&mut self, time: f64) {
        info!("fast clock {time}");
    }
    fn fast_time_rate_changed(&mut self, rate: f32) {
        info!("fast clock rate {rate}");
    }
    fn received_roster_entries(&mut self, count: usize) {
        info!("roster: {count} entries");
    }
    fn received_roster_entry(&mut self, index: usize, entry: &RosterEntry) {
        let length = entry.length.unwrap_or('?');
        info!("  {index}: {} ({length}{})", entry.name, entry.address);
    }
    fn received_turnout_entries(&mut self, count: usize) {
        info!("{count} turnouts");
    }
    fn received_turnout_entry(&mut self, index: usize, entry: &ListEntry) {
        info!("  turnout {index}: {} '{}' state {}", entry.system_name, entry.user_name, entry.state);
    }
    fn received_route_entries(&mut self, count: usize) {
        info!("{count} routes");
    }
    fn received_route_entry(&mut self, index: usize, entry: &ListEntry) {
        info!("  route {index}: {} '{}' state {}", entry.system_name, entry.user_name, entry.state);
    }
    fn received_function_state(&mut self, throttle: ThrottleId, number: u8, pressed: bool) {
        info!("[{throttle}] F{number} {}", if pressed { "on" } else { "off" });
    }
    fn received_speed(&mut self, throttle: ThrottleId, speed: u8) {
        info!("[{throttle}] speed {speed}");
    }
    fn received_direction(&mut self, throttle: ThrottleId, direction: Direction) {
        info!("[{throttle}] direction {}", direction.as_str());
    }
    fn received_speed_steps(&mut self, throttle: ThrottleId, steps: SpeedSteps) {
        info!("[{throttle}] speed steps {steps:?}");
    }
    fn address_added(&mut self, throttle: ThrottleId, address: &str, entry: &str) {
        info!("[{throttle}] acquired {address} ({entry})");
    }
    fn address_removed(&mut self, throttle: ThrottleId, address: &str, command: &str) {
        info!("[{throttle}] released {address} ({command})");
    }
    fn address_steal_needed(&mut self, throttle: ThrottleId, address: &str, _entry: &str) {
        warn!("[{throttle}] {address} is in use elsewhere; steal required");
    }
    fn received_turnout_action(&mut self, system_name: &str, state: TurnoutState) {
        info!("turnout {system_name} {state:?}");
    }
    fn received_route_action(&mut self, system_name: &str, state: RouteState) {
        info!("route {system_name} {state:?}");
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = load_config(&cli)?;

    let addr = (config.server.host.as_str(), config.server.port);
    let transport = TcpTransport::connect(addr)
        .with_context(|| format!("connecting to {}:{}", addr.0, addr.1))?;
    info!("connected to {}:{}", addr.0, addr.1);

    let clock = SystemClock::new();
    let mut wit = WiThrottle::new(config.protocol.clone());
    let mut delegate = LoggingDelegate;
    wit.connect(transport, clock.now_ms());

    let throttle = ThrottleId::new(cli.throttle);
    if let Some(loco) = &cli.loco {
        wit.add_locomotive(throttle, loco)?;
        let direction = if cli.reverse {
            Direction::Reverse
        } else {
            Direction::Forward
        };
        wit.set_direction(throttle, "*", direction, true)?;
        if let Some(speed) = cli.speed {
            wit.set_speed(throttle, speed, false)?;
        }
    }

    let deadline = (cli.duration > 0).then(|| cli.duration * 1000);
    loop {
        let now = clock.now_ms();
        if deadline.is_some_and(|end| now >= end) {
            break;
        }
        if let Err(e) = wit.check(now, &mut delegate) {
            warn!("connection lost: {e}");
            return Ok(());
        }
        thread::sleep(Duration::from_millis(LOOP_INTERVAL_MS));
    }

    if cli.loco.is_some() {
        wit.emergency_stop(throttle, "*");
        wit.release_locomotive(throttle, "*");
        // Let the queue drain before quitting
        let drain_until = clock.now_ms() + 500;
        while clock.now_ms() < drain_until && wit.queued_commands().next().is_some() {
            wit.check(clock.now_ms(), &mut delegate)?;
            thread::sleep(Duration::from_millis(LOOP_INTERVAL_MS));
        }
    }
    if let Some(mut transport) = wit.disconnect() {
        let drain_until = clock.now_ms() + 500;
        while transport.flush_pending()? > 0 && clock.now_ms() < drain_until {
            thread::sleep(Duration::from_millis(LOOP_INTERVAL_MS));
        }
    }
    info!("disconnected");
    Ok(())
}
