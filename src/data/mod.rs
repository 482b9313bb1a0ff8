//! Buffer-side data: decoded samples, min/max pyramids and events.

pub mod buffer;
pub mod downsample;
pub mod event;
pub mod init_task;
pub mod math_utils;
