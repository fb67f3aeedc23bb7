//! Process-wide parallelism limit.
//!
//! # Responsibilities
//! - Hold the "maximum simultaneous CPU-bound jobs" setting
//! - Report the processor counts visible to the process
//! - Time-share CPU slots between jobs so at most `current()` run at once
//!
//! # Design Decisions
//! - The setting is a single `AtomicUsize`; get-and-swap is one atomic step
//! - Values <= 1 passed to `set` leave the setting untouched
//! - Slots are permits of a FIFO `Semaphore`; jobs run one slice per permit
//!   and requeue, so short jobs get a turn while long ones are running
//! - Shrinking below the number of held permits records a debt that is paid
//!   by forgetting permits as they come back

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use thiserror::Error;
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinError;

/// Processors available to this process after affinity and CPU quotas.
///
/// This is the default for the setting.
pub fn available_cpus() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

/// Logical processors this process may be scheduled on, ignoring CPU quotas.
#[cfg(target_os = "linux")]
pub fn logical_cpus() -> usize {
    // SAFETY: `cpu_set_t` is plain data, zeroed is a valid empty set, and the
    // size passed matches the buffer.
    let count = unsafe {
        let mut set: libc::cpu_set_t = std::mem::zeroed();
        if libc::sched_getaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &mut set) == 0 {
            libc::CPU_COUNT(&set)
        } else {
            0
        }
    };
    if count > 0 {
        count as usize
    } else {
        available_cpus()
    }
}

/// Logical processors this process may be scheduled on.
#[cfg(not(target_os = "linux"))]
pub fn logical_cpus() -> usize {
    available_cpus()
}

/// Error running a job behind the gate.
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("CPU slots closed: {0}")]
    Closed(#[from] AcquireError),

    #[error("compute task failed: {0}")]
    Task(#[from] JoinError),
}

/// Work that runs in bounded slices and can be resumed between them.
pub trait Sliced: Send + 'static {
    type Output: Send + 'static;

    /// Do one slice of work. `Some` once the job is complete.
    fn step(&mut self) -> Option<Self::Output>;
}

/// Outcome of a [`Parallelism::set`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitChange {
    /// Setting in effect after the call.
    pub current: usize,
    /// Setting in effect before the call.
    pub previous: usize,
}

/// Shared parallelism setting and CPU slot pool.
#[derive(Debug)]
pub struct Parallelism {
    /// Maximum number of CPU-bound jobs allowed to run at once.
    limit: AtomicUsize,
    /// Logical processors visible at startup.
    available: usize,
    /// Jobs currently holding a slot.
    running: AtomicUsize,
    /// One permit per free slot.
    slots: Arc<Semaphore>,
    /// Permits still to be retired after the limit was lowered.
    debt: Mutex<usize>,
}

impl Parallelism {
    /// Create a setting initialized to `limit`, clamped to `1..=Semaphore::MAX_PERMITS`.
    pub fn new(limit: usize, available: usize) -> Self {
        let limit = limit.clamp(1, Semaphore::MAX_PERMITS);
        Self {
            limit: AtomicUsize::new(limit),
            available: available.max(1),
            running: AtomicUsize::new(0),
            slots: Arc::new(Semaphore::new(limit)),
            debt: Mutex::new(0),
        }
    }

    /// Default the setting to the quota-adjusted processor count and report
    /// the logical processor count as available.
    pub fn from_system() -> Self {
        Self::new(available_cpus(), logical_cpus())
    }

    /// Current setting.
    pub fn current(&self) -> usize {
        self.limit.load(Ordering::SeqCst)
    }

    /// Logical processors available to the process.
    pub fn available(&self) -> usize {
        self.available
    }

    /// Number of jobs holding a slot right now.
    pub fn running(&self) -> usize {
        self.running.load(Ordering::SeqCst)
    }

    fn debt(&self) -> MutexGuard<'_, usize> {
        self.debt.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Replace the setting with `requested` and report the previous value.
    ///
    /// `requested <= 1` is a query: the setting is left as is and both
    /// fields of the result carry the current value. Values above
    /// `Semaphore::MAX_PERMITS` are clamped.
    pub fn set(&self, requested: i64) -> LimitChange {
        if requested <= 1 {
            let current = self.current();
            return LimitChange {
                current,
                previous: current,
            };
        }

        let requested = usize::try_from(requested)
            .unwrap_or(usize::MAX)
            .min(Semaphore::MAX_PERMITS);

        let mut debt = self.debt();
        let previous = self.limit.swap(requested, Ordering::SeqCst);
        if requested > previous {
            let grow = requested - previous;
            let repaid = grow.min(*debt);
            *debt -= repaid;
            if grow > repaid {
                self.slots.add_permits(grow - repaid);
            }
        } else if requested < previous {
            let shrink = previous - requested;
            let retired = self.slots.forget_permits(shrink);
            *debt += shrink - retired;
        }

        LimitChange {
            current: requested,
            previous,
        }
    }

    fn permit(self: &Arc<Self>, permit: OwnedSemaphorePermit) -> ComputePermit {
        self.running.fetch_add(1, Ordering::SeqCst);
        ComputePermit {
            permit: Some(permit),
            gate: Arc::clone(self),
        }
    }

    /// Claim a slot if one is free and nobody is queued ahead.
    pub fn try_acquire(self: &Arc<Self>) -> Option<ComputePermit> {
        let permit = Arc::clone(&self.slots).try_acquire_owned().ok()?;
        Some(self.permit(permit))
    }

    /// Wait in line for a slot.
    pub async fn acquire(self: &Arc<Self>) -> Result<ComputePermit, ComputeError> {
        let permit = Arc::clone(&self.slots).acquire_owned().await?;
        Ok(self.permit(permit))
    }

    /// Run `job` on the blocking pool, one slice per slot.
    ///
    /// After every slice the slot is returned and the job queues again, so
    /// other jobs interleave with it. Dropping the returned future stops the
    /// job after the slice in progress.
    pub async fn run<J: Sliced>(self: &Arc<Self>, mut job: J) -> Result<J::Output, ComputeError> {
        loop {
            let permit = self.acquire().await?;
            let (returned, output) = tokio::task::spawn_blocking(move || {
                let _permit = permit;
                let output = job.step();
                (job, output)
            })
            .await?;

            if let Some(output) = output {
                return Ok(output);
            }
            job = returned;
        }
    }
}

impl Default for Parallelism {
    fn default() -> Self {
        Self::from_system()
    }
}

/// A claimed CPU slot. Released on drop.
#[derive(Debug)]
pub struct ComputePermit {
    permit: Option<OwnedSemaphorePermit>,
    gate: Arc<Parallelism>,
}

impl Drop for ComputePermit {
    fn drop(&mut self) {
        self.gate.running.fetch_sub(1, Ordering::SeqCst);
        let Some(permit) = self.permit.take() else {
            return;
        };

        let mut debt = self.gate.debt();
        if *debt > 0 {
            *debt -= 1;
            permit.forget();
        } else {
            drop(permit);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    /// Counts down one unit per slice.
    struct Countdown {
        left: u32,
        slice_time: Duration,
    }

    impl Sliced for Countdown {
        type Output = ();

        fn step(&mut self) -> Option<()> {
            std::thread::sleep(self.slice_time);
            self.left = self.left.saturating_sub(1);
            (self.left == 0).then_some(())
        }
    }

    #[test]
    fn defaults_to_available_cpus() {
        let p = Parallelism::from_system();
        assert!(p.available() >= 1);
        assert_eq!(p.current(), available_cpus());
        assert!(logical_cpus() >= 1);
    }

    #[test]
    fn set_swaps_and_reports_previous() {
        let p = Parallelism::new(8, 8);
        let change = p.set(4);
        assert_eq!(change, LimitChange { current: 4, previous: 8 });
        assert_eq!(p.current(), 4);
    }

    #[test]
    fn set_at_or_below_one_is_a_query() {
        let p = Parallelism::new(3, 8);
        for requested in [1, 0, -5, i64::MIN] {
            let change = p.set(requested);
            assert_eq!(change, LimitChange { current: 3, previous: 3 });
            assert_eq!(p.current(), 3);
        }
    }

    #[test]
    fn huge_values_are_clamped() {
        let p = Parallelism::new(2, 2);
        let change = p.set(i64::MAX);
        assert_eq!(change.current, Semaphore::MAX_PERMITS);
        assert_eq!(p.current(), Semaphore::MAX_PERMITS);
    }

    #[test]
    fn permits_respect_limit() {
        let p = Arc::new(Parallelism::new(2, 2));
        let a = p.try_acquire().unwrap();
        let _b = p.try_acquire().unwrap();
        assert!(p.try_acquire().is_none());
        assert_eq!(p.running(), 2);

        drop(a);
        assert_eq!(p.running(), 1);
        assert!(p.try_acquire().is_some());
    }

    #[test]
    fn lowering_limit_retires_held_permits() {
        let p = Arc::new(Parallelism::new(4, 4));
        let a = p.try_acquire().unwrap();
        let b = p.try_acquire().unwrap();
        let c = p.try_acquire().unwrap();

        p.set(2);
        assert!(p.try_acquire().is_none());

        drop(a);
        assert!(p.try_acquire().is_none(), "returned slot pays the debt");
        drop(b);
        let d = p.try_acquire().unwrap();
        assert!(p.try_acquire().is_none());
        drop(c);
        drop(d);

        let _x = p.try_acquire().unwrap();
        let _y = p.try_acquire().unwrap();
        assert!(p.try_acquire().is_none());
    }

    #[test]
    fn raising_limit_repays_debt_first() {
        let p = Arc::new(Parallelism::new(4, 4));
        let held: Vec<_> = (0..4).map(|_| p.try_acquire().unwrap()).collect();

        p.set(2);
        p.set(3);
        drop(held);

        let _a = p.try_acquire().unwrap();
        let _b = p.try_acquire().unwrap();
        let _c = p.try_acquire().unwrap();
        assert!(p.try_acquire().is_none());
    }

    #[tokio::test]
    async fn raising_limit_wakes_waiter() {
        let p = Arc::new(Parallelism::new(2, 2));
        let _a = p.try_acquire().unwrap();
        let _b = p.try_acquire().unwrap();

        let waiter = {
            let p = Arc::clone(&p);
            tokio::spawn(async move {
                let _permit = p.acquire().await.unwrap();
            })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        p.set(3);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should be admitted after raising the limit")
            .unwrap();
    }

    #[tokio::test]
    async fn run_finishes_job_and_releases_slot() {
        let p = Arc::new(Parallelism::new(2, 2));
        let job = Countdown {
            left: 3,
            slice_time: Duration::ZERO,
        };
        p.run(job).await.unwrap();
        assert_eq!(p.running(), 0);
    }

    #[tokio::test]
    async fn short_job_gets_a_turn_while_limit_is_saturated() {
        let p = Arc::new(Parallelism::new(1, 1));

        let long = {
            let p = Arc::clone(&p);
            tokio::spawn(async move {
                let job = Countdown {
                    left: u32::MAX,
                    slice_time: Duration::from_millis(5),
                };
                p.run(job).await
            })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        let short = Countdown {
            left: 1,
            slice_time: Duration::ZERO,
        };
        tokio::time::timeout(Duration::from_secs(3), p.run(short))
            .await
            .expect("short job should interleave with the long one")
            .unwrap();

        long.abort();
    }

    #[tokio::test]
    async fn run_never_exceeds_limit() {
        struct PeakTracker {
            gate: Arc<Parallelism>,
            peak: Arc<AtomicUsize>,
            left: u32,
        }

        impl Sliced for PeakTracker {
            type Output = ();

            fn step(&mut self) -> Option<()> {
                self.peak.fetch_max(self.gate.running(), Ordering::SeqCst);
                std::thread::sleep(Duration::from_millis(5));
                self.left -= 1;
                (self.left == 0).then_some(())
            }
        }

        let p = Arc::new(Parallelism::new(2, 2));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut jobs = Vec::new();
        for _ in 0..6 {
            let p = Arc::clone(&p);
            let job = PeakTracker {
                gate: Arc::clone(&p),
                peak: Arc::clone(&peak),
                left: 3,
            };
            jobs.push(tokio::spawn(async move { p.run(job).await.unwrap() }));
        }
        for job in jobs {
            job.await.unwrap();
        }

        assert!(peak.load(Ordering::SeqCst) <= 2);
        assert_eq!(p.running(), 0);
    }
}
