use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use serde::Deserialize;

use crate::channels::Channels;
use crate::error::{Error, Result};
use crate::intervaltimer::IntervalTimer;
use crate::pattern::Pattern;
use crate::pwmsink::PwmSink;

pub const DEFAULT_REFRESH_INTERVAL_MS: u32 = 20;
pub const DEFAULT_TRANSITION_MS: u32 = 200;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TransitionConfig {
    pub enabled: bool,
    pub refresh_interval_ms: u32,
    pub transition_ms: u32,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        TransitionConfig {
            enabled: true,
            refresh_interval_ms: DEFAULT_REFRESH_INTERVAL_MS,
            transition_ms: DEFAULT_TRANSITION_MS,
        }
    }
}

impl TransitionConfig {
    fn sanitized(mut self) -> TransitionConfig {
        if self.refresh_interval_ms == 0 {
            log::warn!(
                "Refresh interval of 0 ms is not usable, falling back to {} ms",
                DEFAULT_REFRESH_INTERVAL_MS
            );
            self.refresh_interval_ms = DEFAULT_REFRESH_INTERVAL_MS;
        }
        self
    }

    fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms as u64)
    }

    fn transition_duration(&self) -> Duration {
        Duration::from_millis(self.transition_ms as u64)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    const BOTH: [Side; 2] = [Side::Left, Side::Right];

    fn index(self) -> usize {
        match self {
            Side::Left => 0,
            Side::Right => 1,
        }
    }
}

struct Slot {
    pattern: Pattern,
    assigned_at: Instant,
    changed: bool,
    fade_from: Channels,
    last_output: Channels,
}

impl Slot {
    fn new(color: Channels) -> Slot {
        Slot {
            pattern: Pattern::constant(color),
            assigned_at: Instant::now(),
            changed: false,
            fade_from: color,
            last_output: color,
        }
    }

    fn assign(&mut self, pattern: Pattern) {
        self.fade_from = self.last_output;
        self.pattern = pattern;
        self.assigned_at = Instant::now();
        self.changed = true;
    }
}

/// What the loop needs from a slot for one tick, copied out under the lock.
struct SlotSnapshot {
    pattern: Pattern,
    assigned_at: Instant,
    new_fade_from: Option<Channels>,
}

struct Shared {
    slots: Mutex<[Slot; 2]>,
    running: AtomicBool,
}

impl Shared {
    fn slots(&self) -> MutexGuard<'_, [Slot; 2]> {
        // Slot state stays consistent even if a holder panicked
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

struct Transition {
    started: Instant,
    from: Channels,
}

/// Drives two independently assignable pattern slots and cross-fades on change.
pub struct LightHandler<S: PwmSink> {
    shared: Arc<Shared>,
    sink: Arc<Mutex<S>>,
    config: TransitionConfig,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl<S: PwmSink> LightHandler<S> {
    pub fn new(default_color: Channels, config: TransitionConfig, sink: S) -> LightHandler<S> {
        LightHandler {
            shared: Arc::new(Shared {
                slots: Mutex::new([Slot::new(default_color), Slot::new(default_color)]),
                running: AtomicBool::new(false),
            }),
            sink: Arc::new(Mutex::new(sink)),
            config: config.sanitized(),
            worker: Mutex::new(None),
        }
    }

    pub fn start(&self) -> Result<()> {
        let mut worker = self.worker.lock().unwrap_or_else(|e| e.into_inner());
        if self.shared.running.load(Ordering::Acquire) {
            return Ok(());
        }

        self.shared.running.store(true, Ordering::Release);
        let mut loop_worker = Worker::new(
            Arc::clone(&self.shared),
            Arc::clone(&self.sink),
            self.config,
        );
        let res = thread::Builder::new()
            .name("LightHandler".to_string())
            .spawn(move || loop_worker.run());

        match res {
            Ok(handle) => {
                log::info!(
                    "Light handler started ({} ms refresh, transitions {})",
                    self.config.refresh_interval_ms,
                    if self.config.enabled { "on" } else { "off" }
                );
                *worker = Some(handle);
                Ok(())
            }
            Err(err) => {
                self.shared.running.store(false, Ordering::Release);
                Err(Error::ThreadSpawn(err))
            }
        }
    }

    /// Stops the loop and waits for it. No sink writes happen after this returns.
    pub fn stop(&self) {
        let mut worker = self.worker.lock().unwrap_or_else(|e| e.into_inner());
        if !self.shared.running.swap(false, Ordering::AcqRel) {
            return;
        }

        if let Some(handle) = worker.take() {
            handle.thread().unpark();
            if handle.join().is_err() {
                log::error!("Light handler thread panicked");
            }
        }
        log::info!("Light handler stopped");
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    pub fn set_pattern(&self, side: Side, pattern: Pattern) {
        self.shared.slots()[side.index()].assign(pattern);
        log::debug!("{side:?} pattern set to {pattern:?}");
    }

    pub fn set_pattern_left(&self, pattern: Pattern) {
        self.set_pattern(Side::Left, pattern);
    }

    pub fn set_pattern_right(&self, pattern: Pattern) {
        self.set_pattern(Side::Right, pattern);
    }

    /// Applies the same pattern to both sides.
    pub fn set_patterns(&self, pattern: Pattern) {
        let mut slots = self.shared.slots();
        for slot in slots.iter_mut() {
            slot.assign(pattern);
        }
        log::debug!("Both patterns set to {pattern:?}");
    }

    pub fn last_output(&self, side: Side) -> Channels {
        self.shared.slots()[side.index()].last_output
    }
}

impl<S: PwmSink> Drop for LightHandler<S> {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Blend fraction is `elapsed / duration`, clamped to `[0, 1]`.
pub fn blend(from: &Channels, to: &Channels, elapsed: Duration, duration: Duration) -> Channels {
    if duration.is_zero() {
        return *to;
    }

    let f = elapsed.as_secs_f32() / duration.as_secs_f32();
    from.lerp(to, f)
}

struct Worker<S: PwmSink> {
    shared: Arc<Shared>,
    sink: Arc<Mutex<S>>,
    config: TransitionConfig,
    transitions: [Option<Transition>; 2],
}

impl<S: PwmSink> Worker<S> {
    fn new(shared: Arc<Shared>, sink: Arc<Mutex<S>>, config: TransitionConfig) -> Worker<S> {
        Worker {
            shared,
            sink,
            config,
            transitions: [None, None],
        }
    }

    fn run(&mut self) {
        let mut timer = IntervalTimer::new(self.config.refresh_interval(), true);
        while self.shared.running.load(Ordering::Acquire) {
            self.update(Instant::now());
            if !timer.sleep_until_next_tick(&self.shared.running) {
                break;
            }
        }
    }

    fn update(&mut self, now: Instant) {
        let snapshots = self.take_snapshots();

        let mut outputs = [Channels::zero(); 2];
        for side in Side::BOTH {
            outputs[side.index()] = self.compute(side, &snapshots[side.index()], now);
        }
        self.store_outputs(&outputs);

        let mut sink = self.sink.lock().unwrap_or_else(|e| e.into_inner());
        sink.write(&outputs[0], &outputs[1]);
    }

    fn take_snapshots(&self) -> [SlotSnapshot; 2] {
        let mut slots = self.shared.slots();
        slots.each_mut().map(|slot| {
            let new_fade_from = if slot.changed {
                slot.changed = false;
                Some(slot.fade_from)
            } else {
                None
            };
            SlotSnapshot {
                pattern: slot.pattern,
                assigned_at: slot.assigned_at,
                new_fade_from,
            }
        })
    }

    fn store_outputs(&self, outputs: &[Channels; 2]) {
        let mut slots = self.shared.slots();
        for (slot, output) in slots.iter_mut().zip(outputs) {
            slot.last_output = *output;
            // Reassigned after the snapshot: fade from what was just produced
            if slot.changed {
                slot.fade_from = *output;
            }
        }
    }

    fn compute(&mut self, side: Side, snapshot: &SlotSnapshot, now: Instant) -> Channels {
        let transition = &mut self.transitions[side.index()];
        if let Some(from) = snapshot.new_fade_from {
            *transition = Some(Transition { started: now, from });
        }

        let elapsed = now.saturating_duration_since(snapshot.assigned_at);
        let target = snapshot.pattern.sample(elapsed.as_millis() as u64);

        if !self.config.enabled {
            return target;
        }

        let duration = self.config.transition_duration();
        let progress = transition
            .as_ref()
            .map(|t| (now.saturating_duration_since(t.started), t.from));
        match progress {
            Some((since, from)) if since < duration => blend(&from, &target, since, duration),
            _ => {
                *transition = None;
                target
            }
        }
    }
}
