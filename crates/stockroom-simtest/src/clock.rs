//! Round clock owned by the presentation side. One tick is one second.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundClock {
    remaining: u32,
    elapsed: u32,
}

impl RoundClock {
    pub fn new(time_limit: u32) -> Self {
        Self {
            remaining: time_limit,
            elapsed: 0,
        }
    }

    /// Advance one second. Returns false once the clock has expired.
    pub fn tick(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        self.elapsed += 1;
        true
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn elapsed(&self) -> u32 {
        self.elapsed
    }

    pub fn expired(&self) -> bool {
        self.remaining == 0
    }
}
