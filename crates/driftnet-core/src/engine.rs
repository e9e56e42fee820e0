//! Fixed-timestep simulation engine
//!
//! Advances a generic state with a user-supplied update function at a fixed
//! timestep, using an accumulator so simulated time never drifts from
//! `tick × timestep` no matter how irregularly `frame` is called.
//!
//! The wall-clock mode is an explicit timer handle rather than a hidden
//! interval: `start` arms it, the host scheduler calls `pump` every
//! `poll_interval`, and `stop` disarms it. After `stop` returns no further
//! ticks happen until `start` is called again.

use crate::time::{SystemClock, Tick, TimeSource};
use crate::{DeterministicRng, SimulationConfig, SimulationSnapshot};
use std::time::Duration;
use tracing::{debug, trace};

/// Deterministic fixed-step simulation over state `S`
///
/// `F` is called once per tick with the state, the engine's RNG and the
/// timestep. It must be pure apart from those arguments.
pub struct SimulationEngine<S, F, C = SystemClock>
where
    F: FnMut(&mut S, &mut DeterministicRng, Duration),
    C: TimeSource,
{
    /// Duration of one tick
    timestep: Duration,
    /// Ticks executed so far
    tick: Tick,
    /// Random source handed to the update function
    rng: DeterministicRng,
    /// Simulated state
    state: S,
    /// Per-tick update function
    update: F,
    /// Elapsed time not yet consumed by a tick
    accumulator: Duration,
    /// Time source for the wall-clock timer
    clock: C,
    /// Reading at the previous timer callback; `Some` while running
    last_pump: Option<Duration>,
}

impl<S, F> SimulationEngine<S, F, SystemClock>
where
    F: FnMut(&mut S, &mut DeterministicRng, Duration),
{
    /// Create a stopped engine at tick 0, seeded from `config.seed`
    pub fn new(config: &SimulationConfig, initial_state: S, update: F) -> crate::Result<Self> {
        config.validate()?;
        Ok(Self::from_parts(
            config.timestep,
            0,
            DeterministicRng::new(config.seed),
            initial_state,
            update,
            SystemClock::new(),
        ))
    }

    /// Create a stopped engine resuming from a snapshot
    ///
    /// `config.seed` is ignored; the RNG continues from `snapshot.rng_state`.
    pub fn restore(
        config: &SimulationConfig,
        snapshot: SimulationSnapshot<S>,
        update: F,
    ) -> crate::Result<Self> {
        config.validate()?;
        Ok(Self::from_parts(
            config.timestep,
            snapshot.tick,
            DeterministicRng::from_state(snapshot.rng_state),
            snapshot.state,
            update,
            SystemClock::new(),
        ))
    }
}

impl<S, F, C> SimulationEngine<S, F, C>
where
    F: FnMut(&mut S, &mut DeterministicRng, Duration),
    C: TimeSource,
{
    fn from_parts(
        timestep: Duration,
        tick: Tick,
        rng: DeterministicRng,
        state: S,
        update: F,
        clock: C,
    ) -> Self {
        Self {
            timestep,
            tick,
            rng,
            state,
            update,
            accumulator: Duration::ZERO,
            clock,
            last_pump: None,
        }
    }

    /// Replace the time source used by the wall-clock timer
    ///
    /// The returned engine is stopped; simulation state is carried over.
    pub fn with_time_source<C2: TimeSource>(self, clock: C2) -> SimulationEngine<S, F, C2> {
        SimulationEngine {
            timestep: self.timestep,
            tick: self.tick,
            rng: self.rng,
            state: self.state,
            update: self.update,
            accumulator: self.accumulator,
            clock,
            last_pump: None,
        }
    }

    /// Feed elapsed time and run as many whole ticks as it covers
    ///
    /// Returns the number of ticks executed (possibly zero).
    pub fn frame(&mut self, elapsed: Duration) -> u64 {
        self.accumulator = self.accumulator.saturating_add(elapsed);

        let mut steps = 0;
        while self.accumulator >= self.timestep {
            (self.update)(&mut self.state, &mut self.rng, self.timestep);
            self.accumulator -= self.timestep;
            self.tick += 1;
            steps += 1;
        }

        if steps > 0 {
            trace!(tick = self.tick, steps, "simulation advanced");
        }
        steps
    }

    /// Run exactly `steps` ticks worth of time through `frame`
    pub fn advance(&mut self, steps: u32) -> u64 {
        self.frame(self.timestep.saturating_mul(steps))
    }

    /// Arm the wall-clock timer
    ///
    /// Calling this while already running changes nothing.
    pub fn start(&mut self) {
        if self.last_pump.is_some() {
            return;
        }
        self.last_pump = Some(self.clock.now());
        debug!(tick = self.tick, interval = ?self.poll_interval(), "simulation timer started");
    }

    /// Disarm the wall-clock timer
    ///
    /// Calling this while stopped changes nothing.
    pub fn stop(&mut self) {
        if self.last_pump.take().is_some() {
            debug!(tick = self.tick, "simulation timer stopped");
        }
    }

    /// Timer callback: forward the wall time elapsed since the previous
    /// callback to `frame`
    ///
    /// Returns the number of ticks executed. A stopped engine returns 0.
    pub fn pump(&mut self) -> u64 {
        let Some(last) = self.last_pump else {
            return 0;
        };
        let now = self.clock.now();
        self.last_pump = Some(now);
        self.frame(now.saturating_sub(last))
    }

    /// How often the host should call `pump`: half a timestep
    pub fn poll_interval(&self) -> Duration {
        self.timestep / 2
    }

    /// Whether the wall-clock timer is armed
    pub fn is_running(&self) -> bool {
        self.last_pump.is_some()
    }

    /// Ticks executed so far
    pub fn tick(&self) -> Tick {
        self.tick
    }

    /// Read-only view of the simulated state
    pub fn current_state(&self) -> &S {
        &self.state
    }

    /// Mutable access to the state between ticks
    ///
    /// Use this to deliver external events such as received inputs. A replay
    /// only reproduces the run if it applies the same mutations at the same
    /// ticks.
    pub fn current_state_mut(&mut self) -> &mut S {
        &mut self.state
    }

    /// Current internal RNG state
    pub fn rng_state(&self) -> u64 {
        self.rng.state()
    }

    /// Duration of one tick
    pub fn timestep(&self) -> Duration {
        self.timestep
    }

    /// Simulated time, always exactly `tick × timestep`
    pub fn elapsed(&self) -> Duration {
        let nanos = self.timestep.as_nanos().saturating_mul(u128::from(self.tick));
        Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }

    /// Elapsed time not yet consumed by a tick
    pub fn accumulated(&self) -> Duration {
        self.accumulator
    }

    /// Leftover accumulator as a fraction of one timestep, in [0, 1)
    ///
    /// Useful for blending the last two ticks when rendering.
    pub fn interpolation_alpha(&self) -> f64 {
        self.accumulator.as_secs_f64() / self.timestep.as_secs_f64()
    }
}

impl<S, F, C> SimulationEngine<S, F, C>
where
    S: Clone,
    F: FnMut(&mut S, &mut DeterministicRng, Duration),
    C: TimeSource,
{
    /// Capture tick, RNG state and a copy of the state
    pub fn snapshot(&self) -> SimulationSnapshot<S> {
        SimulationSnapshot::new(self.tick, self.rng.state(), self.state.clone())
    }

    /// Roll back in place to a previously captured snapshot
    ///
    /// The accumulator is cleared; the timer keeps its running state.
    pub fn rollback(&mut self, snapshot: &SimulationSnapshot<S>) {
        debug!(from = self.tick, to = snapshot.tick, "simulation rolled back");
        self.tick = snapshot.tick;
        self.rng = DeterministicRng::from_state(snapshot.rng_state);
        self.state = snapshot.state.clone();
        self.accumulator = Duration::ZERO;
    }
}

impl<S, F, C> std::fmt::Debug for SimulationEngine<S, F, C>
where
    S: std::fmt::Debug,
    F: FnMut(&mut S, &mut DeterministicRng, Duration),
    C: TimeSource,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationEngine")
            .field("timestep", &self.timestep)
            .field("tick", &self.tick)
            .field("rng", &self.rng)
            .field("state", &self.state)
            .field("accumulator", &self.accumulator)
            .field("running", &self.is_running())
            .finish()
    }
}
