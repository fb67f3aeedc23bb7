//! CPU-bound work and the limit that governs it.
//!
//! # Data Flow
//! ```text
//! GET /isPrime/{n}
//!     → prime.rs (O(n) scan, cut into slices)
//!     → parallelism.rs (each slice waits in line for a CPU slot,
//!                       runs on the blocking pool, then requeues)
//!
//! GET|POST /maxProcs
//!     → parallelism.rs (read or swap the limit, resize the slot pool)
//! ```

pub mod parallelism;
pub mod prime;

pub use parallelism::{
    available_cpus, logical_cpus, ComputeError, ComputePermit, LimitChange, Parallelism, Sliced,
};
pub use prime::{is_prime, PrimeScan};
