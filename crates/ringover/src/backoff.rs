/// Contention backoff for CAS retry loops (Crossbeam-style).
///
/// `spin` doubles the number of PAUSE hints up to a cap. `snooze` spins
/// first and then yields to the OS, for waits that depend on another
/// thread finishing an operation rather than on winning a CAS.
#[derive(Debug)]
pub struct Backoff {
    step: u32,
}

impl Backoff {
    const SPIN_LIMIT: u32 = 6; // 2^6 = 64 spins max before yielding

    /// Creates a new backoff instance.
    #[inline]
    pub fn new() -> Self {
        Self { step: 0 }
    }

    /// Light spin with PAUSE hints, used after a lost CAS.
    #[inline]
    pub fn spin(&mut self) {
        #[cfg(feature = "loom")]
        loom::thread::yield_now();

        #[cfg(not(feature = "loom"))]
        for _ in 0..1u32 << self.step.min(Self::SPIN_LIMIT) {
            std::hint::spin_loop();
        }

        if self.step <= Self::SPIN_LIMIT {
            self.step += 1;
        }
    }

    /// Heavier backoff: spin, then yield once the spin budget is used up.
    #[inline]
    pub fn snooze(&mut self) {
        if self.step <= Self::SPIN_LIMIT {
            self.spin();
        } else {
            #[cfg(feature = "loom")]
            loom::thread::yield_now();

            #[cfg(not(feature = "loom"))]
            std::thread::yield_now();
        }
    }

}

impl Default for Backoff {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(all(test, not(feature = "loom")))]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_saturates() {
        let mut b = Backoff::new();
        assert_eq!(b.step, 0);

        b.spin();
        assert!(b.step > 0);

        while b.step <= Backoff::SPIN_LIMIT {
            b.snooze();
        }
        // Saturated snooze yields without growing further
        let step = b.step;
        b.snooze();
        assert_eq!(b.step, step);
    }
}
