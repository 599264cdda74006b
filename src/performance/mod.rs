//! # Frame Statistics
//!
//! FPS and frame-time readout for the debug overlay. Frame time is the
//! interval between consecutive presented frames, so it includes vsync waits.
//!
//! ```rust
//! use decal_stage::performance::PerformanceMonitor;
//!
//! let mut monitor = PerformanceMonitor::new();
//! // once per redraw
//! monitor.frame();
//! let fps = monitor.get_metrics().fps;
//! # let _ = fps;
//! ```

use std::collections::VecDeque;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct PerformanceMetrics {
    pub fps: f32,
    /// Average over the sample window, milliseconds
    pub frame_time_ms: f32,
    pub min_frame_time_ms: f32,
    pub max_frame_time_ms: f32,
    /// Objects drawn in the last frame
    pub visible_objects: usize,
    /// Triangles of the visible objects
    pub triangles: usize,
}

impl Default for PerformanceMetrics {
    fn default() -> Self {
        Self {
            fps: 0.0,
            frame_time_ms: 0.0,
            min_frame_time_ms: 0.0,
            max_frame_time_ms: 0.0,
            visible_objects: 0,
            triangles: 0,
        }
    }
}

pub struct PerformanceMonitor {
    /// Ring buffer of recent frame intervals
    frame_times: VecDeque<Duration>,
    max_samples: usize,
    last_frame: Option<Instant>,
    current_metrics: PerformanceMetrics,
    last_update: Option<Instant>,
    /// Metrics are recomputed at most this often
    update_interval: Duration,
}

impl PerformanceMonitor {
    pub fn new() -> Self {
        Self::with_config(120, Duration::from_millis(250)) // ~2 seconds at 60fps
    }

    pub fn with_config(max_samples: usize, update_interval: Duration) -> Self {
        Self {
            frame_times: VecDeque::with_capacity(max_samples),
            max_samples: max_samples.max(1),
            last_frame: None,
            current_metrics: PerformanceMetrics::default(),
            last_update: None,
            update_interval,
        }
    }

    /// Marks a presented frame
    pub fn frame(&mut self) {
        self.frame_at(Instant::now());
    }

    /// Marks a frame presented at `now`; the first call only starts the clock
    pub fn frame_at(&mut self, now: Instant) {
        if let Some(previous) = self.last_frame.replace(now) {
            if self.frame_times.len() >= self.max_samples {
                self.frame_times.pop_front();
            }
            self.frame_times.push_back(now.saturating_duration_since(previous));
        }

        let due = self
            .last_update
            .map_or(true, |at| now.saturating_duration_since(at) >= self.update_interval);
        if due {
            self.update_metrics();
            self.last_update = Some(now);
        }
    }

    fn update_metrics(&mut self) {
        if self.frame_times.is_empty() {
            return;
        }

        let total: Duration = self.frame_times.iter().sum();
        let average_ms = total.as_secs_f32() * 1000.0 / self.frame_times.len() as f32;
        self.current_metrics.frame_time_ms = average_ms;
        self.current_metrics.fps = if average_ms > 0.0 {
            1000.0 / average_ms
        } else {
            0.0
        };

        if let (Some(min), Some(max)) = (self.frame_times.iter().min(), self.frame_times.iter().max()) {
            self.current_metrics.min_frame_time_ms = min.as_secs_f32() * 1000.0;
            self.current_metrics.max_frame_time_ms = max.as_secs_f32() * 1000.0;
        }
    }

    pub fn update_render_stats(&mut self, visible_objects: usize, triangles: usize) {
        self.current_metrics.visible_objects = visible_objects;
        self.current_metrics.triangles = triangles;
    }

    pub fn get_metrics(&self) -> &PerformanceMetrics {
        &self.current_metrics
    }

    /// Frame times in milliseconds, oldest first
    pub fn get_frame_time_history(&self) -> Vec<f32> {
        self.frame_times
            .iter()
            .map(|duration| duration.as_secs_f32() * 1000.0)
            .collect()
    }

    /// Compact corner overlay, the stage's stats box
    pub fn render_overlay(&self, ui: &imgui::Ui) {
        let display_size = ui.io().display_size;
        let metrics = &self.current_metrics;

        ui.window("Stats")
            .size([170.0, 110.0], imgui::Condition::Always)
            .position([display_size[0] - 180.0, 10.0], imgui::Condition::Always)
            .no_decoration()
            .no_inputs()
            .bg_alpha(0.3)
            .build(|| {
                ui.text(format!("FPS: {:.0}", metrics.fps));
                ui.text(format!(
                    "{:.1}ms ({:.1}-{:.1})",
                    metrics.frame_time_ms, metrics.min_frame_time_ms, metrics.max_frame_time_ms
                ));
                if !self.frame_times.is_empty() {
                    let history = self.get_frame_time_history();
                    ui.plot_lines("##frame_times", &history)
                        .graph_size([150.0, 40.0])
                        .scale_min(0.0)
                        .scale_max(50.0)
                        .build();
                }
            });
    }
}

impl Default for PerformanceMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steady_frames_give_expected_fps() {
        let mut monitor = PerformanceMonitor::with_config(10, Duration::ZERO);
        let start = Instant::now();
        for i in 0..=10 {
            monitor.frame_at(start + Duration::from_millis(20 * i));
        }
        let metrics = monitor.get_metrics();
        assert!((metrics.frame_time_ms - 20.0).abs() < 0.01);
        assert!((metrics.fps - 50.0).abs() < 0.1);
    }

    #[test]
    fn sample_window_is_bounded() {
        let mut monitor = PerformanceMonitor::with_config(4, Duration::ZERO);
        let start = Instant::now();
        for i in 0..20 {
            monitor.frame_at(start + Duration::from_millis(10 * i));
        }
        assert_eq!(monitor.get_frame_time_history().len(), 4);
    }

    #[test]
    fn first_frame_only_starts_the_clock() {
        let mut monitor = PerformanceMonitor::new();
        monitor.frame_at(Instant::now());
        assert!(monitor.get_frame_time_history().is_empty());
        assert_eq!(monitor.get_metrics().fps, 0.0);
    }

    #[test]
    fn min_and_max_track_spikes() {
        let mut monitor = PerformanceMonitor::with_config(8, Duration::ZERO);
        let start = Instant::now();
        monitor.frame_at(start);
        monitor.frame_at(start + Duration::from_millis(16));
        monitor.frame_at(start + Duration::from_millis(66));
        let metrics = monitor.get_metrics();
        assert!((metrics.min_frame_time_ms - 16.0).abs() < 0.01);
        assert!((metrics.max_frame_time_ms - 50.0).abs() < 0.01);
    }
}
