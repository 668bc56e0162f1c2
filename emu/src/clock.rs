//! # Clock synchronization
//!
//! The CPU does not run free: every bus access costs a number of ticks and
//! ticks are handed out by whoever owns the system clock.
//!
//! ```text
//!   host thread                       CPU thread
//!   ───────────                       ──────────
//!   clock.tick()  ── N ticks ──►  [ bounded FIFO ]  ──►  wait_for_tick()
//!        │                                                    │
//!   clock.wait_for_cycle()  ◄──── cycle complete (every N) ───┘
//! ```
//!
//! `N` is the configured clock multiple. Ticks are consumed strictly in the
//! order they were produced, and every `N` consumed ticks count as one full
//! CPU cycle, which releases a host blocked in [`ClockSync::wait_for_cycle`].
//!
//! [`FreeRunningClock`] is the single-threaded equivalent: ticks are always
//! available and cycles are only counted.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use crate::tick_queue::TickQueue;

/// Source of CPU ticks.
pub trait Clock: Send + Sync {
    /// One pulse of the system clock, producing `clock_multiple` ticks.
    fn tick(&self);

    /// Blocks until a tick is available and consumes it.
    ///
    /// Returns the sequence number of the consumed tick.
    fn wait_for_tick(&self) -> u64;

    /// Full CPU cycles elapsed so far.
    fn cycles(&self) -> u64;
}

struct SyncState {
    queue: TickQueue<u64>,
    produced: u64,
    consumed_in_cycle: u32,
    cycles_requested: u64,
    cycles_completed: u64,
}

/// Tick handshake between a clock thread and a CPU thread.
pub struct ClockSync {
    multiple: u32,
    state: Mutex<SyncState>,
    tick_available: Condvar,
    space_available: Condvar,
    cycle_complete: Condvar,
}

impl ClockSync {
    /// `multiple` of zero is treated as one.
    #[must_use]
    pub fn new(multiple: u32) -> Self {
        let multiple = multiple.max(1);
        Self {
            multiple,
            state: Mutex::new(SyncState {
                queue: TickQueue::new(multiple as usize),
                produced: 0,
                consumed_in_cycle: 0,
                cycles_requested: 0,
                cycles_completed: 0,
            }),
            tick_available: Condvar::new(),
            space_available: Condvar::new(),
            cycle_complete: Condvar::new(),
        }
    }

    #[must_use]
    pub const fn multiple(&self) -> u32 {
        self.multiple
    }

    fn lock(&self) -> MutexGuard<'_, SyncState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Blocks until every cycle requested through [`Clock::tick`] so far
    /// has been fully consumed by the CPU.
    pub fn wait_for_cycle(&self) -> u64 {
        let mut state = self.lock();
        while state.cycles_completed < state.cycles_requested {
            state = self
                .cycle_complete
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        state.cycles_completed
    }

    /// Ticks waiting to be consumed.
    #[must_use]
    pub fn pending_ticks(&self) -> usize {
        self.lock().queue.len()
    }
}

impl Clock for ClockSync {
    fn tick(&self) {
        let mut state = self.lock();
        state.cycles_requested += 1;

        for _ in 0..self.multiple {
            while state.queue.is_full() {
                state = self
                    .space_available
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner);
            }

            let sequence = state.produced;
            if state.queue.push(sequence).is_ok() {
                state.produced += 1;
            }
            self.tick_available.notify_one();
        }
    }

    fn wait_for_tick(&self) -> u64 {
        let mut state = self.lock();
        let sequence = loop {
            if let Some(sequence) = state.queue.pop() {
                break sequence;
            }
            state = self
                .tick_available
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        };
        self.space_available.notify_one();

        state.consumed_in_cycle += 1;
        if state.consumed_in_cycle == self.multiple {
            state.consumed_in_cycle = 0;
            state.cycles_completed += 1;
            tracing::trace!("cpu cycle {} complete", state.cycles_completed);
            self.cycle_complete.notify_all();
        }

        sequence
    }

    fn cycles(&self) -> u64 {
        self.lock().cycles_completed
    }
}

/// Never blocks: every requested tick is immediately available.
#[derive(Debug)]
pub struct FreeRunningClock {
    multiple: u64,
    ticks: AtomicU64,
}

impl FreeRunningClock {
    #[must_use]
    pub fn new(multiple: u32) -> Self {
        Self {
            multiple: u64::from(multiple.max(1)),
            ticks: AtomicU64::new(0),
        }
    }

    /// Ticks consumed so far.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }
}

impl Default for FreeRunningClock {
    fn default() -> Self {
        Self::new(1)
    }
}

impl Clock for FreeRunningClock {
    fn tick(&self) {}

    fn wait_for_tick(&self) -> u64 {
        self.ticks.fetch_add(1, Ordering::Relaxed)
    }

    fn cycles(&self) -> u64 {
        self.ticks() / self.multiple
    }
}
