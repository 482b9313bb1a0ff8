//! Layout parameters of the signal browser and the values derived from them.

use crate::data::math_utils::round125;

/// Scale and grid state. Recomputed by every layout pass.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutState {
    pub pixel_per_sec: f64,
    pub signal_height: i32,
    pub signal_spacing: i32,
    pub preferred_x_grid_pixel_interval: i32,
    pub preferred_y_grid_pixel_interval: i32,
    /// Computed by the last layout pass.
    pub x_grid_pixel_interval: f64,
    pub show_x_grid: bool,
    pub show_y_grid: bool,
    pub show_channel_labels: bool,
    pub show_x_scales: bool,
    pub show_y_scales: bool,
}

impl Default for LayoutState {
    fn default() -> Self {
        Self {
            pixel_per_sec: 100.0,
            signal_height: 75,
            signal_spacing: 0,
            preferred_x_grid_pixel_interval: 100,
            preferred_y_grid_pixel_interval: 25,
            x_grid_pixel_interval: 0.0,
            show_x_grid: true,
            show_y_grid: true,
            show_channel_labels: true,
            show_x_scales: true,
            show_y_scales: true,
        }
    }
}

impl LayoutState {
    /// Vertical distance between the tops of two neighbouring channels.
    pub fn row_pitch(&self) -> i32 {
        self.signal_height.saturating_add(self.signal_spacing)
    }

    /// Whether `rows` rows of `signal_height + signal_spacing` pixels fit in
    /// an `i32` scene.
    pub fn rows_fit(signal_height: i32, signal_spacing: i32, rows: usize) -> bool {
        i32::try_from(rows)
            .ok()
            .and_then(|rows| signal_height.checked_add(signal_spacing)?.checked_mul(rows))
            .is_some()
    }

    /// Timeline width in pixels.
    pub fn scene_width(&self, block_duration: f64, number_blocks: usize) -> i32 {
        (block_duration * number_blocks as f64 * self.pixel_per_sec) as i32
    }

    pub fn scene_height(&self, shown_channels: usize) -> i32 {
        let rows = i32::try_from(shown_channels).unwrap_or(i32::MAX);
        self.row_pitch().saturating_mul(rows)
    }

    /// Pixel distance between x grid lines: the preferred distance snapped
    /// so that lines fall on 1/2/5 * 10^k seconds.
    pub fn compute_x_grid_pixel_interval(&self) -> f64 {
        let seconds = round125(self.preferred_x_grid_pixel_interval as f64 / self.pixel_per_sec);
        self.pixel_per_sec * seconds
    }

    /// Seconds between x grid lines after the last layout pass.
    pub fn x_grid_interval_secs(&self) -> f64 {
        if self.pixel_per_sec > 0.0 {
            self.x_grid_pixel_interval / self.pixel_per_sec
        } else {
            0.0
        }
    }
}
