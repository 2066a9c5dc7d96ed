use std::collections::VecDeque;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::frame::FrameSize;

const FPS_WINDOW: Duration = Duration::from_secs(1);

/// Counters and timings for frames passing through the pipeline.
#[derive(Debug, Clone, Default)]
pub struct FrameStats {
    frames_processed: u64,
    frames_rejected: u64,
    last_duration: Option<Duration>,
    last_resolution: Option<FrameSize>,
    recent: VecDeque<Instant>,
}

/// Plain copy of [`FrameStats`] suitable for crossing the C boundary.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub frames_processed: u64,
    pub frames_rejected: u64,
    pub last_width: u32,
    pub last_height: u32,
    pub last_process_micros: u64,
    pub fps: f32,
}

impl FrameStats {
    pub fn record_frame(&mut self, size: FrameSize, duration: Duration) {
        self.record_frame_at(Instant::now(), size, duration);
    }

    pub fn record_frame_at(&mut self, now: Instant, size: FrameSize, duration: Duration) {
        self.frames_processed += 1;
        self.last_duration = Some(duration);
        self.last_resolution = Some(size);

        self.recent.push_back(now);
        while let Some(&oldest) = self.recent.front() {
            if now.duration_since(oldest) < FPS_WINDOW {
                break;
            }
            self.recent.pop_front();
        }
    }

    pub fn record_rejected(&mut self) {
        self.frames_rejected += 1;
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    pub fn frames_rejected(&self) -> u64 {
        self.frames_rejected
    }

    pub fn last_duration(&self) -> Option<Duration> {
        self.last_duration
    }

    pub fn last_resolution(&self) -> Option<FrameSize> {
        self.last_resolution
    }

    /// Frames recorded within one second of the most recent frame.
    pub fn fps(&self) -> f32 {
        self.recent.len() as f32
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let (last_width, last_height) = self
            .last_resolution
            .map_or((0, 0), |s| (s.width, s.height));

        StatsSnapshot {
            frames_processed: self.frames_processed,
            frames_rejected: self.frames_rejected,
            last_width,
            last_height,
            last_process_micros: self
                .last_duration
                .map_or(0, |d| d.as_micros() as u64),
            fps: self.fps(),
        }
    }
}
