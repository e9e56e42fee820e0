//! Client session: the consumer-facing composite
//!
//! Wires the input buffer, snapshot buffer, reconciler, interpolator and
//! clock synchronizer together behind a packet-in / packet-out interface.
//! The caller owns the transport and the clock; every method takes the
//! current local time in milliseconds.

use crate::codec::{self, Compressor, Message};
use crate::message::{Input, ServerTime, Snapshot, Version};
use crate::{ClockSync, Error, InputBuffer, Interpolator, NetcodeConfig, Reconciler, Result};
use driftnet_snapshot_buffer::{BufferStats, SnapshotBuffer, Timestamp};
use std::collections::VecDeque;
use tracing::{debug, trace, warn};

/// Outstanding clock probes kept before the oldest is forgotten
const MAX_OUTSTANDING_PROBES: usize = 64;

/// Client-side netcode state for one connection
pub struct ClientSession {
    inputs: InputBuffer,
    snapshots: SnapshotBuffer<Snapshot>,
    reconciler: Reconciler,
    interpolator: Interpolator,
    clock: ClockSync,
    compressor: Option<Box<dyn Compressor>>,
    /// Version assigned to the next recorded input
    next_input_version: Version,
    /// Version assigned to the next clock probe
    next_probe_version: Version,
    /// (probe version, local send time) awaiting a `ServerTime` reply
    probes: VecDeque<(Version, u64)>,
    /// Current predicted state
    predicted: Option<Snapshot>,
}

impl ClientSession {
    /// Create a session from a validated configuration
    ///
    /// With `compress` set, outgoing payloads use [`crate::Lz4Compressor`].
    pub fn new(config: &NetcodeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            inputs: InputBuffer::new(),
            snapshots: SnapshotBuffer::new(config.snapshot_capacity)?,
            reconciler: Reconciler::new(),
            interpolator: Interpolator::new(config.interpolation_delay_ms),
            clock: ClockSync::new(config.smoothing_factor)?,
            compressor: default_compressor(config)?,
            next_input_version: 1,
            next_probe_version: 1,
            probes: VecDeque::new(),
            predicted: None,
        })
    }

    /// Use a caller-supplied compressor for both directions
    pub fn with_compressor(mut self, compressor: Box<dyn Compressor>) -> Self {
        self.compressor = Some(compressor);
        self
    }

    /// Record one tick of local input
    ///
    /// The input gets the next version, is buffered for replay, and is
    /// applied to the predicted state immediately. Versions never wrap:
    /// once the counter reaches `Version::MAX` this fails with
    /// [`Error::VersionsExhausted`] and the session must be recreated.
    pub fn record_input(&mut self, horizontal: f32, vertical: f32) -> Result<Input> {
        let input = Input::new(self.next_input_version, horizontal, vertical);
        self.next_input_version = input
            .version
            .checked_add(1)
            .ok_or(Error::VersionsExhausted("input"))?;
        self.inputs.push(input);

        if let Some(predicted) = self.predicted.as_mut() {
            predicted.positions[0] += horizontal;
            predicted.positions[1] += vertical;
            predicted.version = input.version;
        }
        Ok(input)
    }

    /// Frame an input for sending
    pub fn encode_input(&self, input: &Input) -> Result<Vec<u8>> {
        self.encode(&Message::Input(*input))
    }

    /// Frame any message with this session's compressor
    pub fn encode(&self, message: &Message) -> Result<Vec<u8>> {
        codec::encode(message, self.compressor.as_deref())
    }

    /// Frame a clock probe and remember when it was sent
    ///
    /// Fails with [`Error::VersionsExhausted`] once probe versions run out.
    pub fn ping_request(&mut self, now_ms: u64) -> Result<Vec<u8>> {
        let probe = ServerTime {
            version: self.next_probe_version,
            unix_milliseconds: now_ms,
        };
        let next = probe
            .version
            .checked_add(1)
            .ok_or(Error::VersionsExhausted("probe"))?;
        let bytes = self.encode(&Message::ServerTime(probe))?;

        self.next_probe_version = next;
        if self.probes.len() == MAX_OUTSTANDING_PROBES {
            self.probes.pop_front();
        }
        self.probes.push_back((probe.version, now_ms));
        Ok(bytes)
    }

    /// Decode a packet and apply it
    ///
    /// - `Snapshot`: reconciled against pending inputs, then buffered at `now_ms`
    /// - `Ack`: acknowledges inputs up to `input_tick`
    /// - `ServerTime`: answering an outstanding probe, becomes a clock sample
    ///
    /// The decoded message is returned. On error nothing has changed.
    pub fn handle_packet(&mut self, bytes: &[u8], now_ms: u64) -> Result<Message> {
        let message = codec::decode(bytes, self.compressor.as_deref()).inspect_err(|e| {
            warn!(error = %e, len = bytes.len(), "dropping undecodable packet");
        })?;

        match &message {
            Message::Snapshot(snapshot) => self.apply_snapshot(snapshot, now_ms)?,
            Message::Ack(ack) => {
                self.inputs.acknowledge(ack.input_tick);
                debug!(input_tick = ack.input_tick, pending = self.inputs.len(), "ack received");
            }
            Message::ServerTime(time) => self.apply_server_time(time, now_ms)?,
            Message::Input(input) => {
                trace!(version = input.version, "ignoring input addressed to the authority");
            }
        }
        Ok(message)
    }

    fn apply_snapshot(&mut self, snapshot: &Snapshot, now_ms: u64) -> Result<()> {
        let reconciled = self
            .reconciler
            .reconcile(snapshot, &mut self.inputs)
            .inspect_err(|e| warn!(error = %e, version = snapshot.version, "rejected snapshot"))?;

        self.snapshots.push(to_timestamp(now_ms), snapshot.clone());
        self.predicted = Some(reconciled);
        Ok(())
    }

    fn apply_server_time(&mut self, time: &ServerTime, now_ms: u64) -> Result<()> {
        let Some(index) = self.probes.iter().position(|(v, _)| *v == time.version) else {
            debug!(version = time.version, "server time without a matching probe");
            return Ok(());
        };

        let sent = self.probes[index].1;
        self.clock
            .sample(sent, time.unix_milliseconds, now_ms)
            .inspect_err(|e| warn!(error = %e, "rejected clock sample"))?;
        self.probes.remove(index);
        Ok(())
    }

    /// Current predicted state: last reconciliation plus inputs recorded since
    pub fn predicted(&self) -> Option<&Snapshot> {
        self.predicted.as_ref()
    }

    /// Interpolated authoritative state for display at `now_ms`
    pub fn display_state(&self, now_ms: u64) -> Result<Option<Snapshot>> {
        self.interpolator.sample(&self.snapshots, to_timestamp(now_ms))
    }

    /// Most recently received authoritative snapshot
    pub fn latest_snapshot(&self) -> Option<&Snapshot> {
        self.snapshots.latest().map(|e| &e.value)
    }

    /// Smoothed round-trip time in milliseconds
    pub fn ping(&self) -> f64 {
        self.clock.ping()
    }

    /// Smoothed server-minus-client clock offset in milliseconds
    pub fn offset(&self) -> f64 {
        self.clock.offset()
    }

    /// Number of inputs not yet acknowledged
    pub fn pending_inputs(&self) -> usize {
        self.inputs.len()
    }

    /// Number of clock probes awaiting a reply
    pub fn outstanding_probes(&self) -> usize {
        self.probes.len()
    }

    /// Snapshot buffer statistics
    pub fn snapshot_stats(&self) -> BufferStats {
        self.snapshots.stats()
    }
}

impl std::fmt::Debug for ClientSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSession")
            .field("pending_inputs", &self.inputs.len())
            .field("snapshots", &self.snapshots.len())
            .field("ping", &self.clock.ping())
            .field("offset", &self.clock.offset())
            .field("compressed", &self.compressor.is_some())
            .field("predicted", &self.predicted)
            .finish()
    }
}

#[cfg(feature = "lz4")]
fn default_compressor(config: &NetcodeConfig) -> Result<Option<Box<dyn Compressor>>> {
    Ok(config
        .compress
        .then(|| Box::new(crate::Lz4Compressor) as Box<dyn Compressor>))
}

#[cfg(not(feature = "lz4"))]
fn default_compressor(config: &NetcodeConfig) -> Result<Option<Box<dyn Compressor>>> {
    if config.compress {
        return Err(Error::InvalidConfig(
            "compression requested but the lz4 feature is disabled".into(),
        ));
    }
    Ok(None)
}

fn to_timestamp(ms: u64) -> Timestamp {
    Timestamp::try_from(ms).unwrap_or(Timestamp::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Ack;
    use approx::assert_relative_eq;

    fn session() -> ClientSession {
        ClientSession::new(&NetcodeConfig {
            smoothing_factor: 0.5,
            ..Default::default()
        })
        .unwrap()
    }

    fn packet(message: impl Into<Message>) -> Vec<u8> {
        codec::encode(&message.into(), None).unwrap()
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = NetcodeConfig {
            snapshot_capacity: 0,
            ..Default::default()
        };
        assert!(matches!(ClientSession::new(&config), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_record_input_assigns_versions() {
        let mut session = session();
        assert_eq!(session.record_input(1.0, 0.0).unwrap().version, 1);
        assert_eq!(session.record_input(0.0, 1.0).unwrap().version, 2);
        assert_eq!(session.pending_inputs(), 2);
    }

    #[test]
    fn test_versions_never_wrap() {
        let mut session = session();
        session.next_input_version = Version::MAX - 1;
        assert_eq!(session.record_input(1.0, 0.0).unwrap().version, Version::MAX - 1);
        assert!(matches!(
            session.record_input(1.0, 0.0),
            Err(Error::VersionsExhausted("input"))
        ));
        assert_eq!(session.pending_inputs(), 1);

        session.next_probe_version = Version::MAX;
        assert!(matches!(
            session.ping_request(10),
            Err(Error::VersionsExhausted("probe"))
        ));
        assert_eq!(session.outstanding_probes(), 0);
    }

    #[test]
    fn test_snapshot_reconciles_pending_inputs() {
        let mut session = session();
        for _ in 0..3 {
            session.record_input(1.0, 0.0).unwrap();
        }

        let message = session
            .handle_packet(&packet(Snapshot::new(1, vec![0.0, 0.0])), 1000)
            .unwrap();
        assert!(matches!(message, Message::Snapshot(_)));

        let predicted = session.predicted().unwrap();
        assert_eq!(predicted.positions, vec![2.0, 0.0]);
        assert_eq!(predicted.version, 3);
        assert_eq!(session.pending_inputs(), 2);

        // new input moves the prediction straight away
        session.record_input(0.0, 2.0).unwrap();
        assert_eq!(session.predicted().unwrap().positions, vec![2.0, 2.0]);
        assert_eq!(session.predicted().unwrap().version, 4);
    }

    #[test]
    fn test_ack_trims_inputs() {
        let mut session = session();
        for _ in 0..4 {
            session.record_input(0.5, 0.5).unwrap();
        }
        session
            .handle_packet(
                &packet(Ack {
                    version: 1,
                    input_tick: 3,
                }),
                0,
            )
            .unwrap();
        assert_eq!(session.pending_inputs(), 1);
    }

    #[test]
    fn test_ping_probe_produces_sample() {
        let mut session = session();
        let request = session.ping_request(1000).unwrap();
        let Message::ServerTime(probe) = codec::decode(&request, None).unwrap() else {
            panic!("probe is not a ServerTime");
        };
        assert_eq!(session.outstanding_probes(), 1);

        let reply = ServerTime {
            version: probe.version,
            unix_milliseconds: 1090,
        };
        session.handle_packet(&packet(reply), 1100).unwrap();

        assert_relative_eq!(session.ping(), 100.0);
        assert_relative_eq!(session.offset(), 40.0);
        assert_eq!(session.outstanding_probes(), 0);
    }

    #[test]
    fn test_unmatched_server_time_ignored() {
        let mut session = session();
        let reply = ServerTime {
            version: 77,
            unix_milliseconds: 5,
        };
        session.handle_packet(&packet(reply), 10).unwrap();
        assert_eq!(session.ping(), 0.0);
    }

    #[test]
    fn test_causality_violation_keeps_probe() {
        let mut session = session();
        session.ping_request(500).unwrap();
        let reply = ServerTime {
            version: 1,
            unix_milliseconds: 0,
        };
        assert!(matches!(
            session.handle_packet(&packet(reply), 400),
            Err(Error::Causality { .. })
        ));
        assert_eq!(session.outstanding_probes(), 1);
    }

    #[test]
    fn test_bad_packets_leave_state_untouched() {
        let mut session = session();
        session.record_input(1.0, 0.0).unwrap();
        session
            .handle_packet(&packet(Snapshot::new(0, vec![0.0, 0.0])), 100)
            .unwrap();
        let before = session.predicted().cloned();

        assert!(session.handle_packet(&[2], 200).is_err());
        assert!(session
            .handle_packet(&packet(Snapshot::new(1, vec![0.0, 0.0, 0.0])), 200)
            .is_err());
        assert!(session
            .handle_packet(&packet(Snapshot::new(1, vec![0.0])), 200)
            .is_err());

        assert_eq!(session.predicted().cloned(), before);
        assert_eq!(session.pending_inputs(), 1);
        assert_eq!(session.snapshot_stats().count, 1);
    }

    #[test]
    fn test_display_state_interpolates() {
        let mut session = session();
        session
            .handle_packet(&packet(Snapshot::new(1, vec![0.0, 0.0])), 1000)
            .unwrap();
        assert!(session.display_state(1100).unwrap().is_none());

        session
            .handle_packet(&packet(Snapshot::new(2, vec![4.0, 8.0])), 1100)
            .unwrap();
        let shown = session.display_state(1150).unwrap().unwrap();
        assert_relative_eq!(shown.positions[0], 2.0);
        assert_relative_eq!(shown.positions[1], 4.0);
        assert_eq!(session.latest_snapshot().unwrap().version, 2);
    }

    #[cfg(feature = "lz4")]
    #[test]
    fn test_compressed_session_round_trip() {
        let config = NetcodeConfig {
            compress: true,
            ..Default::default()
        };
        let mut session = ClientSession::new(&config).unwrap();

        let input = session.record_input(1.0, -1.0).unwrap();
        let bytes = session.encode_input(&input).unwrap();
        assert_eq!(bytes[1], 1);

        // a plain decoder cannot read it
        assert!(matches!(codec::decode(&bytes, None), Err(Error::MissingDecompressor)));

        let snapshot = session
            .encode(&Message::Snapshot(Snapshot::new(1, vec![3.0, 3.0])))
            .unwrap();
        session.handle_packet(&snapshot, 0).unwrap();
        assert_eq!(session.predicted().unwrap().positions, vec![3.0, 3.0]);
    }
}
