/// Abstraction over real-time sources feeding the game clock.
/// Implementations: SystemTimeProvider (production), MockTimeProvider (testing).
pub trait TimeProvider {
    /// Current real time in microseconds from an arbitrary epoch.
    fn now_us(&self) -> i64;
}

/// Monotonic system time based on std::time::Instant.
pub struct SystemTimeProvider {
    start: std::time::Instant,
}

impl SystemTimeProvider {
    pub fn new() -> Self {
        Self {
            start: std::time::Instant::now(),
        }
    }
}

impl Default for SystemTimeProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeProvider for SystemTimeProvider {
    fn now_us(&self) -> i64 {
        self.start.elapsed().as_micros() as i64
    }
}

/// Settable time source for deterministic tests.
pub struct MockTimeProvider {
    current_us: std::cell::Cell<i64>,
}

impl MockTimeProvider {
    pub fn new() -> Self {
        Self {
            current_us: std::cell::Cell::new(0),
        }
    }

    pub fn set_time(&self, us: i64) {
        self.current_us.set(us);
    }

    /// Advance the mock time and return the new now.
    pub fn advance(&self, delta_us: i64) -> i64 {
        let now = self.current_us.get() + delta_us;
        self.current_us.set(now);
        now
    }
}

impl Default for MockTimeProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeProvider for MockTimeProvider {
    fn now_us(&self) -> i64 {
        self.current_us.get()
    }
}
