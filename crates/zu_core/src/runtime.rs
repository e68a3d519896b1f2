use std::time::{Duration, Instant};

/// Decides when the next redraw should be requested.
///
/// With no cap every `AboutToWait` produces a redraw and presentation
/// (vsync) does the pacing. With a cap, frames are spaced by the target
/// interval and the event loop sleeps until the next deadline.
#[derive(Debug, Clone)]
pub struct FrameScheduler {
    interval: Option<Duration>,
    last_frame: Option<Instant>,
}

impl FrameScheduler {
    pub fn new(target_fps: Option<f32>) -> Self {
        let interval = target_fps
            .filter(|fps| fps.is_finite() && *fps > 0.0)
            .and_then(|fps| Duration::try_from_secs_f32(1.0 / fps).ok());
        Self {
            interval,
            last_frame: None,
        }
    }

    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    pub fn ready_for_frame(&self, now: Instant) -> bool {
        match (self.interval, self.last_frame) {
            (Some(interval), Some(last)) => now.saturating_duration_since(last) >= interval,
            _ => true,
        }
    }

    pub fn mark_rendered(&mut self, now: Instant) {
        self.last_frame = Some(now);
    }

    /// Earliest instant at which another frame is due, if capped.
    pub fn next_deadline(&self) -> Option<Instant> {
        let interval = self.interval?;
        Some(self.last_frame? + interval)
    }

    pub fn reset(&mut self) {
        self.last_frame = None;
    }
}

/// Counts presented frames and reports the average rate once per interval.
#[derive(Debug, Clone)]
pub struct FrameStats {
    interval: Duration,
    window_start: Option<Instant>,
    frames_in_window: u32,
    total_frames: u64,
}

impl FrameStats {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            window_start: None,
            frames_in_window: 0,
            total_frames: 0,
        }
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    /// Records one frame; returns the fps when the current window closes.
    pub fn record(&mut self, now: Instant) -> Option<f32> {
        self.total_frames += 1;
        let start = *self.window_start.get_or_insert(now);
        self.frames_in_window += 1;

        let elapsed = now.saturating_duration_since(start);
        if elapsed < self.interval {
            return None;
        }
        let fps = self.frames_in_window as f32 / elapsed.as_secs_f32();
        self.window_start = Some(now);
        self.frames_in_window = 0;
        Some(fps)
    }
}
