//! Per-channel graphics item state.
//!
//! The model owns one [`SignalItem`] per shown channel and pushes it to the
//! view after every layout pass. The item only holds geometry and vertical
//! scaling; sample data is always read from the buffer.

use serde::{Deserialize, Serialize};

use crate::data::buffer::SignalBuffer;
use crate::data::math_utils::round125;
use crate::reader::SignalChannel;

pub const NAVIGATION_Z: f64 = 0.0;
pub const X_GRID_Z: f64 = 1.0;
pub const CHANNEL_SEPARATOR_Z: f64 = 2.0;
pub const SIGNAL_Z: f64 = 4.0;
pub const EVENT_Z: f64 = 5.0;

/// Margin factor applied when an item takes its range from the buffer.
pub const DEFAULT_RANGE_FACTOR: f64 = 2.0;

/// How `auto_scale` fits a channel into its row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ScaleMode {
    /// Map [min, max] onto the full row.
    #[default]
    MinToMax,
    /// Keep zero on the centre line; fit the larger of |min| and |max|.
    ZeroCentered,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignalItem {
    channel: SignalChannel,
    height: i32,
    x: i32,
    y: i32,
    z: f64,
    visible: bool,
    /// Pixels per physical unit.
    y_zoom: f64,
    /// Physical value drawn on the centre line.
    y_offset: f64,
    minimum: f64,
    maximum: f64,
    y_grid_pixel_interval: f64,
    show_y_grid: bool,
}

impl SignalItem {
    pub fn new(channel: SignalChannel, height: i32) -> Self {
        let minimum = channel.physical_min;
        let maximum = channel.physical_max;
        let mut item = Self {
            channel,
            height,
            x: 0,
            y: 0,
            z: SIGNAL_Z,
            visible: false,
            y_zoom: 1.0,
            y_offset: 0.0,
            minimum,
            maximum,
            y_grid_pixel_interval: 0.0,
            show_y_grid: true,
        };
        item.fit(minimum, maximum, 1.0);
        item
    }

    pub fn channel(&self) -> &SignalChannel {
        &self.channel
    }

    pub fn channel_nr(&self) -> usize {
        self.channel.number
    }

    pub fn label(&self) -> &str {
        &self.channel.label
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn set_height(&mut self, height: i32) {
        self.height = height;
    }

    pub fn pos(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    pub fn set_pos(&mut self, x: i32, y: i32) {
        self.x = x;
        self.y = y;
    }

    pub fn z_value(&self) -> f64 {
        self.z
    }

    pub fn set_z_value(&mut self, z: f64) {
        self.z = z;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn show(&mut self) {
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    pub fn y_zoom(&self) -> f64 {
        self.y_zoom
    }

    pub fn y_offset(&self) -> f64 {
        self.y_offset
    }

    /// Last range taken from the buffer (or the channel's physical range).
    pub fn range(&self) -> (f64, f64) {
        (self.minimum, self.maximum)
    }

    pub fn enable_y_grid(&mut self, enabled: bool) {
        self.show_y_grid = enabled;
    }

    pub fn is_y_grid_enabled(&self) -> bool {
        self.show_y_grid
    }

    pub fn y_grid_pixel_interval(&self) -> f64 {
        self.y_grid_pixel_interval
    }

    /// Y pixel (relative to the item's top) at which `value` is drawn.
    pub fn value_to_y(&self, value: f64) -> f64 {
        self.height as f64 / 2.0 - (value - self.y_offset) * self.y_zoom
    }

    /// Take min/max from the buffer and scale so the range spans
    /// `1 / factor` of the row height.
    pub fn range_from_buffer(&mut self, buffer: &SignalBuffer, factor: f64) {
        let (lo, hi) = buffer.channel_range(self.channel.number);
        self.minimum = lo as f64;
        self.maximum = hi as f64;
        self.fit(self.minimum, self.maximum, factor);
    }

    pub fn zoom_in(&mut self) {
        self.y_zoom *= 2.0;
    }

    pub fn zoom_out(&mut self) {
        self.y_zoom /= 2.0;
    }

    pub fn auto_scale(&mut self, buffer: &SignalBuffer, mode: ScaleMode) {
        let (lo, hi) = buffer.channel_range(self.channel.number);
        self.minimum = lo as f64;
        self.maximum = hi as f64;
        match mode {
            ScaleMode::MinToMax => self.fit(self.minimum, self.maximum, 1.0),
            ScaleMode::ZeroCentered => {
                let extent = self.minimum.abs().max(self.maximum.abs());
                self.fit(-extent, extent, 1.0);
            }
        }
    }

    /// Spacing of y grid lines in pixels, snapped so lines fall on
    /// 1/2/5 * 10^k physical units.
    pub fn update_y_grid_interval(&mut self, preferred_pixel_interval: i32) {
        if self.y_zoom <= 0.0 || !self.y_zoom.is_finite() {
            self.y_grid_pixel_interval = 0.0;
            return;
        }
        let units = round125(preferred_pixel_interval as f64 / self.y_zoom);
        self.y_grid_pixel_interval = units * self.y_zoom;
    }

    fn fit(&mut self, lo: f64, hi: f64, factor: f64) {
        let span = hi - lo;
        let span = if span > 0.0 && span.is_finite() { span } else { 1.0 };
        let factor = if factor > 0.0 { factor } else { 1.0 };
        self.y_offset = (hi + lo) / 2.0;
        self.y_zoom = self.height.max(1) as f64 / (span * factor);
    }
}
