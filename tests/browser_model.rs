mod common;

use std::path::Path;

use common::{attached_model, recording, small_recording, RecordingView};
use sigbrowse::browser::ScaleMode;
use sigbrowse::diagnostics::MemoryLog;
use sigbrowse::{BrowserState, BufferInitError, EventChannel, MemorySignalReader, SignalBrowserModel};

#[test]
fn add_then_remove_toggles_shown() {
    let (mut model, _view, _log) = attached_model(small_recording());
    for ch in 0..3 {
        model.add_channel(ch);
        assert!(model.is_channel_shown(ch), "channel {} should be shown after add", ch);
        model.remove_channel(ch);
        assert!(!model.is_channel_shown(ch), "channel {} should be hidden after remove", ch);
    }
    assert_eq!(model.number_shown_channels(), 0);
}

#[test]
fn add_channel_is_idempotent() {
    let (mut model, view, _log) = attached_model(small_recording());
    model.add_channel(1);
    model.add_channel(1);
    assert_eq!(model.number_shown_channels(), 1);
    assert_eq!(view.log().y_axis, vec![1], "y axis label requested once");
}

#[test]
fn out_of_range_channel_is_rejected_with_log() {
    let (mut model, _view, log) = attached_model(small_recording());
    model.add_channel(3);
    assert_eq!(model.number_shown_channels(), 0);
    assert!(
        log.contains("SignalBrowserModel::addChannel Error: illegal channel number 3"),
        "log was {:?}",
        log.lines()
    );
}

#[test]
fn removing_unknown_channel_is_a_quiet_no_op() {
    let (mut model, _view, log) = attached_model(small_recording());
    model.add_channel(0);
    model.remove_channel(2);
    assert_eq!(model.shown_channels(), vec![0]);
    assert!(log.is_empty());
}

#[test]
fn without_view_every_mutation_is_logged_and_ignored() {
    let mut model = SignalBrowserModel::new(small_recording()).unwrap();
    let log = MemoryLog::new();
    model.set_log_sink(Box::new(log.clone()));

    model.add_channel(0);
    model.init_buffer();
    model.zoom_in_all();
    model.set_pixel_per_sec(10.0);
    model.update_layout();

    assert_eq!(model.number_shown_channels(), 0);
    assert_eq!(model.pixel_per_sec(), 100.0);
    assert!(log.contains("SignalBrowserModel::addChannel Error: SignalBrowser not set"));
    assert!(log.contains("SignalBrowserModel::initBuffer Error: SignalBrowser not set"));
    assert!(log.contains("SignalBrowserModel::updateLayout Error: SignalBrowser not set"));
}

#[test]
fn no_sink_configured_does_not_panic() {
    let mut model = SignalBrowserModel::new(small_recording()).unwrap();
    model.add_channel(0);
    model.update_layout();
    assert_eq!(model.number_shown_channels(), 0);
}

#[test]
fn layout_rows_form_arithmetic_sequence() {
    let (mut model, view, _log) = attached_model(small_recording());
    for ch in [2, 0, 1] {
        model.add_channel(ch);
    }
    model.set_signal_spacing(5);
    model.set_signal_height(40);

    let pitch = 45;
    for (row, ch) in model.shown_channels().into_iter().enumerate() {
        let y = model.channel_y_pos(EventChannel::Channel(ch));
        assert_eq!(y, Some(row as i32 * pitch), "row {} (channel {})", row, ch);
        assert_eq!(view.log().items.get(&ch), Some(&(row as i32 * pitch, 40)));
        assert_eq!(model.signal_item(ch).map(|i| i.pos().1), Some(row as i32 * pitch));
    }
    assert_eq!(model.channel_y_pos(EventChannel::Undefined), Some(0));
    assert_eq!(view.log().scene, Some((20 * 100, 3 * pitch)));
}

#[test]
fn removal_keeps_relative_order() {
    let (mut model, _view, _log) = attached_model(small_recording());
    for ch in [2, 0, 1] {
        model.add_channel(ch);
    }
    model.remove_channel(0);
    model.update_layout();
    assert_eq!(model.shown_channels(), vec![2, 1]);
    assert_eq!(model.channel_nr(1), Some(1));
    assert_eq!(model.channel_y_pos(EventChannel::Channel(1)), Some(75));
    assert_eq!(model.channel_y_pos(EventChannel::Channel(0)), None);
}

#[test]
fn three_channel_recording_scenario() {
    let (mut model, view, _log) = attached_model(recording());
    model.add_channel(0);
    model.add_channel(2);
    model.init_buffer();

    assert_eq!(model.state(), BrowserState::Ready);
    assert_eq!(model.number_shown_channels(), 2);
    assert_eq!(view.log().busy, vec![true, false]);
    assert_eq!(view.log().visible, Some(true));

    model.update_layout();
    assert_eq!(view.log().scene, Some((1000 * 100, 150)));

    model.set_pixel_per_sec(40.0);
    assert_eq!(view.log().scene, Some((1000 * 40, 150)));
}

#[test]
fn init_fits_items_to_buffer_range() {
    let (mut model, _view, _log) = attached_model(recording());
    model.add_channel(0);
    model.init_buffer();

    let item = model.signal_item(0).unwrap();
    let (lo, hi) = item.range();
    assert!((lo + 10.0).abs() < 1e-3 && (hi - 10.0).abs() < 1e-3, "range {:?}", item.range());
    assert!(item.y_offset().abs() < 1e-3);
    // 75 px / (20 uV * 2.0)
    assert!((item.y_zoom() - 1.875).abs() < 1e-6);
}

#[test]
fn vertical_zoom_and_auto_scale() {
    let (mut model, _view, _log) = attached_model(small_recording());
    model.add_channel(1);
    model.init_buffer();
    let fitted = model.signal_item(1).unwrap().y_zoom();

    model.zoom_in_all();
    assert_eq!(model.signal_item(1).unwrap().y_zoom(), fitted * 2.0);
    model.zoom_out_all();
    model.zoom_out_all();
    assert_eq!(model.signal_item(1).unwrap().y_zoom(), fitted / 2.0);

    model.auto_scale_all();
    let item = model.signal_item(1).unwrap();
    let (lo, hi) = item.range();
    assert!((item.y_zoom() - 75.0 / (hi - lo)).abs() < 1e-9);

    model.set_auto_zoom_behaviour(ScaleMode::ZeroCentered);
    model.auto_scale_all();
    assert_eq!(model.signal_item(1).unwrap().y_offset(), 0.0);
}

#[test]
fn mutations_are_rejected_while_initializing() {
    let (mut model, _view, log) = attached_model(small_recording());
    model.add_channel(0);
    let task = model.start_init_buffer().expect("init starts");
    assert_eq!(model.state(), BrowserState::InitBuffer);

    model.add_channel(1);
    assert_eq!(model.number_shown_channels(), 1, "registry must not change during init");
    assert!(
        log.contains("SignalBrowserModel::addChannel Error: illegal state (InitBuffer)"),
        "log was {:?}",
        log.lines()
    );
    assert!(model.start_init_buffer().is_none());

    model.finish_init_buffer(task);
    assert_eq!(model.state(), BrowserState::Ready);
    assert!(model.buffer().has_data(0));
}

#[test]
fn background_init_reports_progress() {
    let (mut model, _view, _log) = attached_model(recording());
    model.add_channel(0);
    let mut task = model.start_init_buffer().unwrap();
    while !task.is_finished() {
        std::thread::sleep(std::time::Duration::from_millis(1));
    }
    let progress = task.progress().expect("worker reported progress");
    assert_eq!(progress.records_done, progress.records_total);
    assert_eq!(progress.fraction(), 1.0);
    model.finish_init_buffer(task);
    assert_eq!(model.state(), BrowserState::Ready);
}

#[test]
fn cancelled_init_keeps_previous_data() {
    let reader = small_recording();
    let (mut model, _view, _log) = attached_model(reader.clone());
    model.add_channel(0);
    model.init_buffer();
    model.add_channel(1);

    // hold the reader so the worker cannot start decoding before the cancel
    let guard = reader.lock().unwrap();
    let task = model.start_init_buffer().unwrap();
    task.cancel();
    drop(guard);
    model.finish_init_buffer(task);

    assert_eq!(model.state(), BrowserState::Ready);
    assert!(model.buffer().has_data(0));
    assert!(!model.buffer().has_data(1));
    assert!(model.last_init_error().is_none());
}

#[test]
fn failed_init_keeps_old_state_and_blocks_mutation() {
    let reader = small_recording();
    let (mut model, _view, log) = attached_model(reader.clone());
    model.add_channel(0);
    model.init_buffer();
    let before = model.buffer().decoded(0).unwrap().samples().to_vec();

    reader.lock().unwrap().close();
    model.init_buffer();
    assert_eq!(model.state(), BrowserState::InitFailed);
    assert_eq!(model.last_init_error(), Some(&BufferInitError::NotOpen));
    assert_eq!(model.buffer().decoded(0).unwrap().samples(), &before[..]);
    assert!(log.contains("SignalBrowserModel::initBuffer Error: signal reader has no open file"));

    model.add_channel(1);
    assert_eq!(model.number_shown_channels(), 1);
    assert!(log.contains("SignalBrowserModel::addChannel Error: illegal state (InitFailed)"));

    reader.lock().unwrap().open(Path::new("again.gdf")).unwrap();
    model.init_buffer();
    assert_eq!(model.state(), BrowserState::Ready);
    assert!(model.last_init_error().is_none());
}

#[test]
fn reader_failure_mid_init_is_reported() {
    let reader = sigbrowse::shared_reader(MemorySignalReader::synthetic(2, 8.0, 200, 1.0).fail_from_record(Some(100)));
    let (mut model, _view, _log) = attached_model(reader);
    model.add_channel(0);
    model.init_buffer();
    assert_eq!(model.state(), BrowserState::InitFailed);
    assert!(matches!(
        model.last_init_error(),
        Some(BufferInitError::Records { start: 64, count: 64, .. })
    ));
    assert!(!model.buffer().has_data(0));
}

#[test]
fn remove_channel_follows_release_policy() {
    let (mut model, _view, _log) = attached_model(small_recording());
    model.add_channel(0);
    model.add_channel(1);
    model.init_buffer();

    model.remove_channel(0);
    assert!(model.buffer().is_channel_buffered(0));
    assert!(model.buffer().has_data(0));
    assert!(!model.buffer().is_channel_active(0));

    model.set_release_buffer(true);
    model.remove_channel(1);
    assert!(!model.buffer().is_channel_buffered(1));
}

#[test]
fn shown_channels_are_always_buffered() {
    let (mut model, _view, _log) = attached_model(small_recording());
    model.add_channel(2);
    model.add_channel(0);
    model.remove_channel(2);
    model.add_channel(2);
    for ch in model.shown_channels() {
        assert!(model.buffer().is_channel_buffered(ch));
        assert!(model.buffer().is_channel_active(ch));
    }
}

#[test]
fn viewport_suspends_offscreen_channels() {
    let (mut model, _view, _log) = attached_model(small_recording());
    for ch in 0..3 {
        model.add_channel(ch);
    }
    model.update_viewport(80, 70);
    let buffer = model.buffer();
    assert!(!buffer.is_channel_active(0));
    assert!(buffer.is_channel_active(1));
    assert!(!buffer.is_channel_active(2));
    assert!(buffer.is_channel_buffered(0) && buffer.is_channel_buffered(2));

    model.init_buffer();
    assert_eq!(model.buffer().active_channels(), vec![0, 1, 2]);
}

#[test]
fn go_to_and_pixel_per_sec_keep_scroll_position() {
    let (mut model, view, _log) = attached_model(small_recording());
    model.add_channel(0);
    model.add_channel(1);
    model.go_to(2.5, Some(1));
    assert_eq!(view.log().contents_pos, (250, 75));

    model.set_pixel_per_sec(200.0);
    assert_eq!(view.log().contents_pos, (500, 75));

    model.go_to(1.0, None);
    assert_eq!(view.log().contents_pos, (200, 75));
}

#[test]
fn zoom_rect_fills_visible_area() {
    let (mut model, view, _log) = attached_model(small_recording());
    for ch in 0..3 {
        model.add_channel(ch);
    }
    view.set_visible_size(800, 300);
    model.zoom_rect(200, 75, 400, 150);
    assert_eq!(model.pixel_per_sec(), 200.0);
    assert_eq!(model.signal_height(), 150);
    assert_eq!(view.log().contents_pos, (400, 150));
}

#[test]
fn invalid_parameters_are_logged_and_ignored() {
    let (mut model, _view, log) = attached_model(small_recording());
    model.set_pixel_per_sec(0.0);
    model.set_signal_height(-3);
    model.set_signal_spacing(-1);
    assert_eq!(model.pixel_per_sec(), 100.0);
    assert_eq!(model.signal_height(), 75);
    assert_eq!(model.signal_spacing(), 0);
    assert!(log.contains("SignalBrowserModel::setPixelPerSec Error: invalid parameter pixel_per_sec = 0"));
    assert!(log.contains("SignalBrowserModel::setSignalHeight Error: invalid parameter signal_height = -3"));
    assert_eq!(log.len(), 3);
}

#[test]
fn x_grid_snaps_to_nice_seconds() {
    let (mut model, _view, _log) = attached_model(small_recording());
    model.update_layout();
    assert_eq!(model.x_grid_pixel_interval(), 100.0);

    // 100 px at 30 px/s is 3.3 s, snapped to 5 s
    model.set_pixel_per_sec(30.0);
    assert!((model.x_grid_pixel_interval() - 150.0).abs() < 1e-9);

    model.set_preferred_x_grid_pixel_interval(60);
    assert!((model.x_grid_pixel_interval() - 60.0).abs() < 1e-9);
}

#[test]
fn render_columns_follow_pixel_scale() {
    let (mut model, _view, log) = attached_model(small_recording());
    model.add_channel(0);
    model.init_buffer();

    // 16 Hz at 4 px/s: 4 samples per column
    model.set_pixel_per_sec(4.0);
    let cols = model.render_columns(0, 0.0, 4).unwrap();
    assert_eq!(cols.len(), 4);
    for (lo, hi) in cols {
        assert!(lo <= hi);
    }

    assert!(model.render_columns(2, 0.0, 4).is_none());
    assert!(log.contains("renderColumns Error"));
}

#[test]
fn view_can_be_detached() {
    let (mut model, _view, log) = attached_model(small_recording());
    assert!(model.take_view().is_some());
    model.add_channel(0);
    assert!(!model.has_view());
    assert_eq!(model.number_shown_channels(), 0);
    assert_eq!(log.len(), 1);

    model.set_view(Box::new(RecordingView::default()));
    model.add_channel(0);
    assert_eq!(model.number_shown_channels(), 1);
}

#[test]
fn finishing_init_without_view_still_leaves_init_state() {
    let (mut model, _view, log) = attached_model(small_recording());
    model.add_channel(0);
    let task = model.start_init_buffer().expect("init starts");
    let view = model.take_view().expect("view attached");

    model.finish_init_buffer(task);
    assert_eq!(model.state(), BrowserState::Ready);
    assert!(model.buffer().has_data(0));
    assert!(log.contains("SignalBrowserModel::finishInitBuffer Error: SignalBrowser not set"));

    model.set_view(view);
    model.init_buffer();
    assert_eq!(model.state(), BrowserState::Ready, "log was {:?}", log.lines());
}

#[test]
fn lost_init_task_can_be_aborted() {
    let reader = small_recording();
    let (mut model, _view, log) = attached_model(reader.clone());
    model.add_channel(0);
    model.init_buffer();
    model.add_channel(1);

    let guard = reader.lock().unwrap();
    let task = model.start_init_buffer().unwrap();
    let token = task.cancel_token();
    drop(task);
    model.abort_init_buffer();
    drop(guard);

    assert!(token.is_cancelled());
    assert_eq!(model.state(), BrowserState::Ready);
    assert!(model.buffer().has_data(0));
    assert!(!model.buffer().has_data(1));

    model.init_buffer();
    assert!(model.buffer().has_data(1));

    model.abort_init_buffer();
    assert!(log.contains("SignalBrowserModel::abortInitBuffer Error: illegal state (Ready)"));
}

#[test]
fn oversized_rows_are_rejected() {
    let (mut model, view, log) = attached_model(recording());
    for ch in 0..3 {
        model.add_channel(ch);
    }
    model.set_signal_height(1_000_000_000);
    assert_eq!(model.signal_height(), 75);
    assert!(log.contains("SignalBrowserModel::setSignalHeight Error: invalid parameter signal_height = 1000000000"));

    model.set_signal_spacing(i32::MAX);
    assert_eq!(model.signal_spacing(), 0);
    assert!(log.contains("SignalBrowserModel::setSignalSpacing Error: invalid parameter signal_spacing = 2147483647"));

    model.update_layout();
    assert_eq!(view.log().scene.map(|(_, h)| h), Some(225));

    // a row far past the scene clamps instead of overflowing
    model.go_to(0.0, Some(usize::MAX));
    assert_eq!(view.log().contents_pos, (0, i32::MAX));
}

#[test]
fn columns_left_of_recording_start_are_empty() {
    let (mut model, _view, _log) = attached_model(small_recording());
    model.add_channel(0);
    model.init_buffer();
    model.set_pixel_per_sec(4.0);

    // 4 samples per column; the first two columns lie before time 0
    let cols = model.render_columns(0, -2.0, 4).unwrap();
    assert_eq!(cols.len(), 4);
    assert!(cols[..2].iter().all(|(lo, hi)| lo.is_nan() && hi.is_nan()));
    let from_start = model.render_columns(0, 0.0, 2).unwrap();
    assert_eq!(&cols[2..], &from_start[..]);
}
