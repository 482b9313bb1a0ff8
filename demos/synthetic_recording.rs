//! Drive a signal browser over a synthetic recording and print what a view
//! would be told to draw.
//!
//! Run with `RUST_LOG=debug` to see layout passes and buffer windows.

use std::time::Duration;

use sigbrowse::browser::{BrowserView, EventItem, SignalItem};
use sigbrowse::{shared_reader, EventChannel, MemorySignalReader, SignalBrowserModel, SignalEvent, UNDEFINED_CHANNEL};

/// Prints every call instead of painting.
struct ConsoleView;

impl BrowserView for ConsoleView {
    fn resize_scene(&mut self, width: i32, height: i32) {
        println!("scene {} x {}", width, height);
    }

    fn add_signal_item(&mut self, channel_nr: usize, item: &SignalItem) {
        let (x, y) = item.pos();
        println!(
            "  {:<6} ch {} at ({}, {}) h={} zoom={:.3} px/unit",
            item.label(),
            channel_nr,
            x,
            y,
            item.height(),
            item.y_zoom()
        );
    }

    fn y_axis_add_channel(&mut self, channel_nr: usize, item: &SignalItem) {
        println!("y axis + {} ({})", item.label(), channel_nr);
    }

    fn y_axis_remove_channel(&mut self, channel_nr: usize) {
        println!("y axis - {}", channel_nr);
    }

    fn update_event_item(&mut self, item: &EventItem) {
        if item.is_visible() {
            println!("  event {} at {:?} size {:?}", item.id(), item.pos(), item.size());
        }
    }

    fn update(&mut self) {}

    fn set_visible(&mut self, _visible: bool) {}

    fn set_busy(&mut self, busy: bool) {
        if busy {
            println!("busy...");
        }
    }
}

fn sparkline(columns: &[(f32, f32)], lo: f32, hi: f32) -> String {
    const BARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
    let span = (hi - lo).max(f32::EPSILON);
    columns
        .iter()
        .map(|(_, max)| {
            let level = (((max - lo) / span) * 7.0).round().clamp(0.0, 7.0) as usize;
            BARS[level]
        })
        .collect()
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut recording = MemorySignalReader::synthetic(4, 256.0, 600, 1.0).with_events(vec![
        SignalEvent::new(256 * 5, 0x0101, EventChannel::Channel(1), 256),
        SignalEvent::new(256 * 12, 0x0300, UNDEFINED_CHANNEL, 128),
    ]);
    if let Some(start) = chrono::NaiveDate::from_ymd_opt(2024, 3, 1).and_then(|d| d.and_hms_opt(9, 30, 0)) {
        recording = recording.with_recording_time(start);
    }

    let mut model = match SignalBrowserModel::new(shared_reader(recording)) {
        Ok(model) => model,
        Err(e) => {
            eprintln!("cannot open recording: {}", e);
            return;
        }
    };
    if let Some(start) = model.header().recording_time {
        println!("recording started {}", start.format("%Y-%m-%d %H:%M:%S"));
    }
    model.set_view(Box::new(ConsoleView));

    for ch in [0, 1, 3] {
        model.add_channel(ch);
    }

    let Some(mut task) = model.start_init_buffer() else {
        return;
    };
    while !task.is_finished() {
        if let Some(p) = task.progress() {
            println!("decoding {:>5.1}%", p.fraction() * 100.0);
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    model.finish_init_buffer(task);

    model.set_pixel_per_sec(8.0);
    model.update_layout();
    println!("x grid every {} px", model.x_grid_pixel_interval());

    for ch in model.shown_channels() {
        let (lo, hi) = model.buffer().channel_range(ch);
        if let Some(columns) = model.render_columns(ch, 0.0, 64) {
            println!("ch {} {}", ch, sparkline(&columns, lo, hi));
        }
    }
}
