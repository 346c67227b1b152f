//! Periodic control loop: ingest → lock → feedback → control → unlock → publish.
//!
//! ## RT Setup
//! 1. `mlockall(MCL_CURRENT | MCL_FUTURE)` to lock all pages.
//! 2. Prefault stack pages.
//! 3. `sched_setaffinity` to pin the calling thread.
//! 4. `sched_setscheduler(SCHED_FIFO, prio)`.
//!
//! Without the `rt` feature every step is a no-op.
//!
//! ## Pacing
//! Wake times are absolute (`next_wake += period`) so jitter in one cycle
//! never shifts the ones after it. With `rt` the loop sleeps with
//! `clock_nanosleep(TIMER_ABSTIME)` on `CLOCK_MONOTONIC`. A cycle that ends
//! past the next deadline is counted as an overrun and the schedule is
//! re-anchored to the current time instead of bursting to catch up.

use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::controller::{Subsystem, SubsystemHandle};
use crate::topic::Topic;

// ─── Cycle Statistics ───────────────────────────────────────────────

/// Timing of one control loop, updated in O(1) after every cycle.
#[derive(Debug, Clone, Default)]
pub struct CycleStats {
    pub cycle_count: u64,
    /// Cycles whose work ran past the following deadline.
    pub overruns: u64,
    /// Control work of the last cycle [ns].
    pub last_busy_ns: u64,
    pub worst_busy_ns: u64,
    /// Worst wake-up lateness against the scheduled deadline [ns].
    pub worst_wake_ns: u64,
    total_busy_ns: u64,
}

impl CycleStats {
    pub const fn new() -> Self {
        Self {
            cycle_count: 0,
            overruns: 0,
            last_busy_ns: 0,
            worst_busy_ns: 0,
            worst_wake_ns: 0,
            total_busy_ns: 0,
        }
    }

    #[inline]
    pub fn record(&mut self, busy_ns: u64, wake_ns: u64) {
        self.cycle_count += 1;
        self.last_busy_ns = busy_ns;
        self.worst_busy_ns = self.worst_busy_ns.max(busy_ns);
        self.worst_wake_ns = self.worst_wake_ns.max(wake_ns);
        self.total_busy_ns = self.total_busy_ns.saturating_add(busy_ns);
    }

    pub fn mean_busy_ns(&self) -> u64 {
        self.total_busy_ns.checked_div(self.cycle_count).unwrap_or(0)
    }

    /// Mean share of the period spent doing control work.
    pub fn load(&self, period_ns: u64) -> f32 {
        if period_ns == 0 {
            return 0.0;
        }
        self.mean_busy_ns() as f32 / period_ns as f32
    }
}

// ─── RT Setup ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CycleError {
    /// RT system call failed.
    #[error("RT setup error: {0}")]
    RtSetup(String),
}

#[cfg(feature = "rt")]
fn rt_mlockall() -> Result<(), CycleError> {
    use nix::sys::mman::{MlockallFlags, mlockall};
    mlockall(MlockallFlags::MCL_CURRENT | MlockallFlags::MCL_FUTURE)
        .map_err(|e| CycleError::RtSetup(format!("mlockall failed: {e}")))
}

#[cfg(not(feature = "rt"))]
fn rt_mlockall() -> Result<(), CycleError> {
    Ok(())
}

/// Touch stack pages so the control loop never faults them in.
fn prefault_stack() {
    let mut buf = [0u8; 256 * 1024];
    for byte in buf.iter_mut() {
        // SAFETY: `byte` is a valid, exclusively borrowed stack location.
        unsafe { core::ptr::write_volatile(byte, 0xFF) };
    }
    core::hint::black_box(&buf);
}

#[cfg(feature = "rt")]
fn rt_set_affinity(cpu: usize) -> Result<(), CycleError> {
    use nix::sched::{CpuSet, sched_setaffinity};
    use nix::unistd::Pid;

    let mut cpuset = CpuSet::new();
    cpuset
        .set(cpu)
        .map_err(|e| CycleError::RtSetup(format!("CpuSet::set({cpu}) failed: {e}")))?;
    sched_setaffinity(Pid::from_raw(0), &cpuset)
        .map_err(|e| CycleError::RtSetup(format!("sched_setaffinity failed: {e}")))
}

#[cfg(not(feature = "rt"))]
fn rt_set_affinity(_cpu: usize) -> Result<(), CycleError> {
    Ok(())
}

#[cfg(feature = "rt")]
fn rt_set_scheduler(priority: i32) -> Result<(), CycleError> {
    let param = libc::sched_param {
        sched_priority: priority,
    };
    // SAFETY: `param` outlives the call; pid 0 targets the calling thread.
    let ret = unsafe { libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) };
    if ret != 0 {
        let err = std::io::Error::last_os_error();
        return Err(CycleError::RtSetup(format!(
            "sched_setscheduler(SCHED_FIFO, {priority}) failed: {err}"
        )));
    }
    Ok(())
}

#[cfg(not(feature = "rt"))]
fn rt_set_scheduler(_priority: i32) -> Result<(), CycleError> {
    Ok(())
}

/// RT setup for the calling control thread. Call before `run_forever`.
pub fn rt_setup(cpu_core: usize, rt_priority: i32) -> Result<(), CycleError> {
    rt_mlockall()?;
    prefault_stack();
    rt_set_affinity(cpu_core)?;
    rt_set_scheduler(rt_priority)?;
    Ok(())
}

// ─── Clocks ─────────────────────────────────────────────────────────

/// Monotonic time source with absolute-deadline sleeping.
pub trait Clock: Send {
    /// Monotonic time [ns].
    fn now_ns(&self) -> u64;
    /// Suspend until `deadline_ns`. Returns immediately if it has passed.
    fn sleep_until_ns(&mut self, deadline_ns: u64);
}

/// Wall-independent monotonic clock.
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    #[cfg(not(feature = "rt"))]
    origin: std::time::Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            #[cfg(not(feature = "rt"))]
            origin: std::time::Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "rt")]
impl Clock for MonotonicClock {
    fn now_ns(&self) -> u64 {
        use nix::time::{ClockId, clock_gettime};
        clock_gettime(ClockId::CLOCK_MONOTONIC)
            .map(|ts| ts.tv_sec() as u64 * 1_000_000_000 + ts.tv_nsec() as u64)
            .unwrap_or(0)
    }

    fn sleep_until_ns(&mut self, deadline_ns: u64) {
        use nix::sys::time::TimeSpec;
        use nix::time::{ClockId, ClockNanosleepFlags, clock_nanosleep};

        let ts = TimeSpec::new(
            (deadline_ns / 1_000_000_000) as libc::time_t,
            (deadline_ns % 1_000_000_000) as libc::c_long,
        );
        // EINTR leaves us early; the next deadline check absorbs it.
        let _ = clock_nanosleep(
            ClockId::CLOCK_MONOTONIC,
            ClockNanosleepFlags::TIMER_ABSTIME,
            &ts,
        );
    }
}

#[cfg(not(feature = "rt"))]
impl Clock for MonotonicClock {
    fn now_ns(&self) -> u64 {
        self.origin.elapsed().as_nanos() as u64
    }

    fn sleep_until_ns(&mut self, deadline_ns: u64) {
        let now = self.now_ns();
        if deadline_ns > now {
            std::thread::sleep(std::time::Duration::from_nanos(deadline_ns - now));
        }
    }
}

/// Manually driven clock for tests and replay. Clones share the same time.
///
/// Sleeping jumps the clock forward to the deadline.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance_ns(&self, ns: u64) {
        self.now.fetch_add(ns, Ordering::SeqCst);
    }

    pub fn advance_ms(&self, ms: u64) {
        self.advance_ns(ms * 1_000_000);
    }

    pub fn set_ns(&self, ns: u64) {
        self.now.store(ns, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ns(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }

    fn sleep_until_ns(&mut self, deadline_ns: u64) {
        self.now.fetch_max(deadline_ns, Ordering::SeqCst);
    }
}

// ─── Control Loop ───────────────────────────────────────────────────

/// Copies the latest external inputs into a subsystem feed.
///
/// Implementations hold topic subscribers and must never block.
pub trait Ingest: Send {
    type Feed;
    fn ingest(&mut self, feed: &mut Self::Feed);
}

/// Input set for subsystems fed only by their own motors.
#[derive(Debug)]
pub struct NoInputs<F>(PhantomData<fn() -> F>);

impl<F> Default for NoInputs<F> {
    fn default() -> Self {
        Self(PhantomData)
    }
}

impl<F> Ingest for NoInputs<F> {
    type Feed = F;
    fn ingest(&mut self, _feed: &mut F) {}
}

/// One periodic control task for one subsystem instance.
pub struct ControlLoop<S, I, C>
where
    S: Subsystem,
    I: Ingest<Feed = S::Feed>,
    C: Clock,
{
    handle: SubsystemHandle<S>,
    inputs: I,
    clock: C,
    status: Topic<S::Status>,
    feed: S::Feed,
    period_ns: u64,
    next_wake_ns: Option<u64>,
    last_start_ns: Option<u64>,
    stats: CycleStats,
}

impl<S, I, C> ControlLoop<S, I, C>
where
    S: Subsystem,
    I: Ingest<Feed = S::Feed>,
    C: Clock,
{
    pub fn new(handle: SubsystemHandle<S>, inputs: I, clock: C, period_us: u32) -> Self {
        let status = Topic::new(handle.name());
        Self {
            handle,
            inputs,
            clock,
            status,
            feed: S::Feed::default(),
            period_ns: u64::from(period_us) * 1_000,
            next_wake_ns: None,
            last_start_ns: None,
            stats: CycleStats::new(),
        }
    }

    /// Topic carrying the status record published after every cycle.
    pub fn status_topic(&self) -> Topic<S::Status> {
        self.status.clone()
    }

    pub fn handle(&self) -> &SubsystemHandle<S> {
        &self.handle
    }

    pub fn stats(&self) -> &CycleStats {
        &self.stats
    }

    /// Execute one cycle immediately, ignoring the schedule.
    pub fn run_cycle(&mut self) -> S::Status {
        self.cycle(0)
    }

    /// Wait for the next deadline and execute one cycle.
    pub fn step(&mut self) {
        let deadline = match self.next_wake_ns {
            Some(deadline) => deadline,
            None => self.clock.now_ns(),
        };
        self.clock.sleep_until_ns(deadline);
        let woke = self.clock.now_ns();

        self.cycle(woke.saturating_sub(deadline));

        let end = self.clock.now_ns();
        let mut next = deadline + self.period_ns;
        if end > next {
            self.stats.overruns += 1;
            warn!(
                subsystem = self.handle.name(),
                late_ns = end - next,
                overruns = self.stats.overruns,
                "control cycle overrun, re-anchoring schedule"
            );
            next = end;
        }
        self.next_wake_ns = Some(next);
    }

    /// Run forever at the configured period.
    pub fn run_forever(mut self) -> ! {
        info!(
            subsystem = self.handle.name(),
            period_us = self.period_ns / 1_000,
            "control loop started"
        );
        loop {
            self.step();
            if self.stats.cycle_count % 5_000 == 0 {
                debug!(
                    subsystem = self.handle.name(),
                    mean_busy_ns = self.stats.mean_busy_ns(),
                    worst_busy_ns = self.stats.worst_busy_ns,
                    worst_wake_ns = self.stats.worst_wake_ns,
                    load = self.stats.load(self.period_ns),
                    overruns = self.stats.overruns,
                    "cycle stats"
                );
            }
        }
    }

    fn cycle(&mut self, wake_ns: u64) -> S::Status {
        let start = self.clock.now_ns();
        let dt = match self.last_start_ns {
            Some(prev) if start > prev => (start - prev) as f32 * 1e-9,
            _ => self.period_ns as f32 * 1e-9,
        };
        self.last_start_ns = Some(start);
        let now_ms = (start / 1_000_000) as u32;

        self.inputs.ingest(&mut self.feed);

        let status = {
            let mut subsystem = self.handle.lock();
            self.handle.drain_into(&mut subsystem);
            subsystem.update_feedback(&self.feed);
            subsystem.control(now_ms, dt);
            subsystem.status()
        };

        self.status.publish(status.clone());

        let busy = self.clock.now_ns().saturating_sub(start);
        self.stats.record(busy, wake_ns);
        status
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
