//! Loopback Example
//!
//! Runs an authoritative simulation and a client session in one process,
//! connected by a link with fixed latency, jitter and loss. The client
//! predicts locally, reconciles against server snapshots, interpolates
//! display state and estimates ping and clock offset.
//!
//! Run with `RUST_LOG=debug` to see reconciliation and acknowledgement events.

use driftnet_core::{
    DeterministicRng, ManualClock, SimulationConfig, SimulationEngine, TimeSource,
};
use driftnet_netcode::{
    decode, encode, Ack, ClientSession, Input, Message, NetcodeConfig, ServerTime, Snapshot,
    Version,
};
use std::collections::VecDeque;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _};

const RUN_MS: u64 = 5_000;
const STEP_MS: u64 = 5;
const CLIENT_INPUT_EVERY_MS: u64 = 20;
const SNAPSHOT_EVERY_MS: u64 = 50;
const PING_EVERY_MS: u64 = 500;
const REPORT_EVERY_MS: u64 = 1_000;

/// Server clock runs this far ahead of the client's
const SERVER_CLOCK_AHEAD_MS: u64 = 40;

/// Authoritative world: the player at positions 0/1, a wandering NPC at 2/3
#[derive(Debug, Clone, PartialEq)]
struct World {
    positions: Vec<f32>,
    inbox: VecDeque<Input>,
    last_processed: Version,
}

impl World {
    fn new() -> Self {
        Self {
            positions: vec![0.0; 4],
            inbox: VecDeque::new(),
            last_processed: 0,
        }
    }
}

/// One queued input per tick; the NPC wanders on the engine's RNG
fn step(world: &mut World, rng: &mut DeterministicRng, dt: Duration) {
    if let Some(input) = world.inbox.pop_front() {
        world.positions[0] += input.horizontal;
        world.positions[1] += input.vertical;
        world.last_processed = input.version;
    }

    let speed = 2.0 * dt.as_secs_f64();
    world.positions[2] += rng.range_f64(-speed, speed) as f32;
    world.positions[3] += rng.range_f64(-speed, speed) as f32;
}

/// One direction of an unreliable in-process link
struct Link {
    latency_ms: u64,
    jitter_ms: i64,
    loss: f64,
    rng: DeterministicRng,
    in_flight: Vec<(u64, Vec<u8>)>,
    dropped: u64,
}

impl Link {
    fn new(latency_ms: u64, jitter_ms: i64, loss: f64, seed: u64) -> Self {
        Self {
            latency_ms,
            jitter_ms,
            loss,
            rng: DeterministicRng::new(seed),
            in_flight: Vec::new(),
            dropped: 0,
        }
    }

    fn send(&mut self, now_ms: u64, bytes: Vec<u8>) {
        if self.rng.chance(self.loss) {
            self.dropped += 1;
            return;
        }
        let jitter = self.rng.range_i64(-self.jitter_ms, self.jitter_ms);
        let deliver_at = now_ms.saturating_add_signed(self.latency_ms as i64 + jitter);
        self.in_flight.push((deliver_at, bytes));
    }

    /// Packets due at `now_ms`, in delivery order
    fn receive(&mut self, now_ms: u64) -> Vec<Vec<u8>> {
        self.in_flight.sort_by_key(|(at, _)| *at);
        let due = self.in_flight.partition_point(|(at, _)| *at <= now_ms);
        self.in_flight.drain(..due).map(|(_, bytes)| bytes).collect()
    }
}

fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run() {
        eprintln!("loopback failed: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    info!("=== Driftnet Loopback Example ===");

    let sim_config = SimulationConfig::with_tick_rate(50, 42);
    let net_config = NetcodeConfig {
        smoothing_factor: 0.2,
        compress: true,
        ..Default::default()
    };

    let clock = ManualClock::new();
    let mut server = SimulationEngine::new(&sim_config, World::new(), step)?
        .with_time_source(clock.clone());
    server.start();

    let mut client = ClientSession::new(&net_config)?;
    let codec = driftnet_netcode::Lz4Compressor;

    let mut uplink = Link::new(40, 15, 0.02, 1);
    let mut downlink = Link::new(40, 15, 0.02, 2);
    let mut snapshot_version: Version = 0;
    let mut input_rng = DeterministicRng::new(7);

    let mut now = 0;
    while now <= RUN_MS {
        clock.set(Duration::from_millis(now));

        // client side
        if now % CLIENT_INPUT_EVERY_MS == 0 {
            let horizontal = input_rng.range_i64(-1, 1) as f32;
            let vertical = input_rng.range_i64(-1, 1) as f32;
            let input = client.record_input(horizontal, vertical)?;
            uplink.send(now, client.encode_input(&input)?);
        }
        if now % PING_EVERY_MS == 0 {
            uplink.send(now, client.ping_request(now)?);
        }
        for bytes in downlink.receive(now) {
            if let Err(e) = client.handle_packet(&bytes, now) {
                warn!(error = %e, "client dropped packet");
            }
        }

        // server side
        for bytes in uplink.receive(now) {
            match decode(&bytes, Some(&codec))? {
                Message::Input(input) => server.current_state_mut().inbox.push_back(input),
                Message::ServerTime(probe) => {
                    let reply = ServerTime {
                        version: probe.version,
                        unix_milliseconds: clock.now().as_millis() as u64 + SERVER_CLOCK_AHEAD_MS,
                    };
                    downlink.send(now, encode(&reply.into(), Some(&codec))?);
                }
                other => warn!(kind = ?other.kind(), "server ignoring unexpected message"),
            }
        }
        server.pump();

        if now % SNAPSHOT_EVERY_MS == 0 {
            let world = server.current_state();
            snapshot_version = snapshot_version.max(world.last_processed);
            let snapshot = Snapshot::new(snapshot_version, world.positions.clone());
            let ack = Ack {
                version: snapshot_version,
                input_tick: world.last_processed,
            };
            downlink.send(now, encode(&snapshot.into(), Some(&codec))?);
            downlink.send(now, encode(&ack.into(), Some(&codec))?);
        }

        if now % REPORT_EVERY_MS == 0 && now > 0 {
            let shown = client.display_state(now)?;
            info!(
                t = now,
                server_tick = server.tick(),
                ping = client.ping(),
                offset = client.offset(),
                pending = client.pending_inputs(),
                predicted = ?client.predicted().map(|s| &s.positions[..2]),
                displayed = ?shown.as_ref().map(|s| &s.positions[..]),
                "status"
            );
        }

        now += STEP_MS;
    }

    server.stop();
    info!(
        ticks = server.tick(),
        uplink_dropped = uplink.dropped,
        downlink_dropped = downlink.dropped,
        authoritative = ?server.current_state().positions,
        "finished"
    );
    Ok(())
}
