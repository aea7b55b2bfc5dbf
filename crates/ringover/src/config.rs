use crate::error::ConfigError;
use crate::link::NIL;

/// Largest `number_elements` the index space can address (`NIL` is reserved).
pub const MAX_ELEMENTS: usize = NIL as usize;

/// Configuration for [`RingBuffer`](crate::RingBuffer).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Number of elements to allocate, including the one whose queue node
    /// anchors the empty queue. Usable capacity is one less.
    pub number_elements: usize,
    /// Enable metrics collection (slight overhead)
    pub enable_metrics: bool,
}

impl Config {
    /// Creates a new configuration with custom settings.
    pub const fn new(number_elements: usize, enable_metrics: bool) -> Self {
        Self {
            number_elements,
            enable_metrics,
        }
    }

    /// Configuration for a ring holding `slots` unread entries.
    pub const fn with_slots(slots: usize) -> Self {
        Self::new(slots.saturating_add(1), false)
    }

    /// Returns the number of entries the ring holds before overwriting.
    #[inline]
    pub const fn capacity(&self) -> usize {
        self.number_elements.saturating_sub(1)
    }

    /// Toggles metrics collection.
    pub const fn with_metrics(mut self, enable: bool) -> Self {
        self.enable_metrics = enable;
        self
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.number_elements < 2 {
            return Err(ConfigError::TooFewElements {
                requested: self.number_elements,
            });
        }
        if self.number_elements > MAX_ELEMENTS {
            return Err(ConfigError::TooManyElements {
                requested: self.number_elements,
                max: MAX_ELEMENTS,
            });
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            number_elements: 1025, // 1024 slots
            enable_metrics: false,
        }
    }
}

/// Small ring (64 slots, fits in a few cache lines of links)
pub const SMALL_CONFIG: Config = Config::with_slots(64);

/// Large ring (64K slots)
pub const LARGE_CONFIG: Config = Config::with_slots(65_536);

#[cfg(all(test, not(feature = "loom")))]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_excludes_dummy() {
        assert_eq!(Config::new(4, false).capacity(), 3);
        assert_eq!(Config::default().capacity(), 1024);
        assert_eq!(SMALL_CONFIG.capacity(), 64);
        assert_eq!(LARGE_CONFIG.number_elements, 65_537);
    }

    #[test]
    fn test_validate_bounds() {
        assert_eq!(
            Config::new(1, false).validate(),
            Err(ConfigError::TooFewElements { requested: 1 })
        );
        assert!(Config::new(2, false).validate().is_ok());
        assert!(matches!(
            Config::new(MAX_ELEMENTS + 1, false).validate(),
            Err(ConfigError::TooManyElements { .. })
        ));
    }

    #[test]
    fn test_with_metrics() {
        assert!(Config::default().with_metrics(true).enable_metrics);
    }
}
