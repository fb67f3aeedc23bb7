//! Trial-division primality check.
//!
//! The scan is deliberately O(n): it visits every candidate below `n` and
//! never stops early, so request cost grows linearly with the input. That
//! cost is what the server exists to show under a CPU quota.

use crate::compute::parallelism::Sliced;

/// Candidates examined per CPU slot before the scan yields its slot.
pub const SCAN_SLICE: u64 = 1_000_000;

/// Returns `true` if `n` is prime.
pub fn is_prime(n: u64) -> bool {
    if n <= 1 {
        return false;
    }

    let mut prime = true;
    for i in 0..n {
        if i <= 1 {
            continue;
        }
        if n % i == 0 {
            prime = false;
        }
    }

    prime
}

/// [`is_prime`] split into resumable slices of at most `slice` candidates.
#[derive(Debug, Clone)]
pub struct PrimeScan {
    n: u64,
    next: u64,
    prime: bool,
    slice: u64,
}

impl PrimeScan {
    pub fn new(n: u64) -> Self {
        Self::with_slice(n, SCAN_SLICE)
    }

    pub fn with_slice(n: u64, slice: u64) -> Self {
        Self {
            n,
            next: 0,
            prime: n > 1,
            slice: slice.max(1),
        }
    }

    /// Candidates still to examine.
    pub fn remaining(&self) -> u64 {
        self.n - self.next
    }
}

impl Sliced for PrimeScan {
    type Output = bool;

    fn step(&mut self) -> Option<bool> {
        if self.n <= 1 {
            return Some(false);
        }

        let end = self.next.saturating_add(self.slice).min(self.n);
        for i in self.next..end {
            if i <= 1 {
                continue;
            }
            if self.n % i == 0 {
                self.prime = false;
            }
        }
        self.next = end;

        if self.next == self.n {
            Some(self.prime)
        } else {
            None
        }
    }
}
