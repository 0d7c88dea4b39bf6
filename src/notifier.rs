//! Transient status messages
//!
//! A message shown for a fixed time, counted down once per host tick.

/// Time subtracted per tick, one frame at 60 Hz
pub const TICK_QUANTUM: f32 = 0.01667;

/// Auto-expiring status line
#[derive(Debug, Clone, Default)]
pub struct StatusNotifier {
    text: String,
    remaining: f32,
}

impl StatusNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show `message` for `duration_secs`.
    /// An empty message or a non-positive duration clears the current one.
    pub fn show(&mut self, message: impl Into<String>, duration_secs: f32) {
        let message = message.into();
        if duration_secs <= 0.0 || message.is_empty() {
            self.clear();
            return;
        }
        self.text = message;
        self.remaining = duration_secs;
    }

    /// Advance by one tick
    pub fn tick(&mut self) {
        if self.text.is_empty() {
            return;
        }
        self.remaining -= TICK_QUANTUM;
        if self.remaining <= 0.0 {
            self.clear();
        }
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.remaining = 0.0;
    }

    /// The visible message, if any
    pub fn message(&self) -> Option<&str> {
        if self.text.is_empty() {
            None
        } else {
            Some(&self.text)
        }
    }

    pub fn is_active(&self) -> bool {
        !self.text.is_empty()
    }
}
