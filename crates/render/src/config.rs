use std::time::Duration;

/// Render loop configuration.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Time between frame callbacks.
    pub frame_interval: Duration,
    /// Stop after this many frames. `None` runs until the channel closes.
    pub max_frames: Option<u64>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            frame_interval: Duration::from_millis(16),
            max_frames: None,
        }
    }
}

impl RenderConfig {
    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }

    pub fn with_max_frames(mut self, frames: u64) -> Self {
        self.max_frames = Some(frames);
        self
    }
}
