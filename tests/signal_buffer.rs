use sigbrowse::data::buffer::SignalBuffer;
use sigbrowse::data::init_task::{CancelToken, InitControl};
use sigbrowse::{shared_reader, BufferError, BufferInitError, EventChannel, MemorySignalReader, SignalEvent, WholeBufferMode};

fn buffer(channels: usize, rate: f64, records: usize) -> SignalBuffer {
    SignalBuffer::new(shared_reader(MemorySignalReader::synthetic(channels, rate, records, 1.0))).unwrap()
}

fn expected(ch: usize, rate: f64, i: usize) -> f32 {
    let amplitude = 10.0 * (ch + 1) as f64;
    let t = i as f64 / rate;
    (amplitude * (2.0 * std::f64::consts::PI * (ch + 1) as f64 * t).sin()) as f32
}

#[test]
fn timeline_comes_from_records() {
    let buffer = buffer(2, 32.0, 50);
    assert_eq!(buffer.block_duration(), 1.0);
    assert_eq!(buffer.number_blocks(), 50);
}

#[test]
fn full_mode_keeps_every_sample() {
    let mut buffer = buffer(2, 32.0, 50);
    buffer.set_whole_data_buffer(WholeBufferMode::Full);
    buffer.add_channel(1);
    buffer.init().unwrap();

    let decoded = buffer.decoded(1).unwrap();
    assert_eq!(decoded.samples().len(), 32 * 50);
    assert!(!decoded.pyramid().levels().is_empty());
    assert_eq!(decoded.pyramid().source_len(), 32 * 50);

    let samples = buffer.samples(1, 100, 3).unwrap();
    let want: Vec<f32> = (100..103).map(|i| expected(1, 32.0, i)).collect();
    assert_eq!(samples, want);
}

#[test]
fn subsampled_mode_keeps_only_the_pyramid() {
    let mut buffer = buffer(1, 32.0, 50);
    buffer.set_whole_data_buffer(WholeBufferMode::Subsampled);
    buffer.add_channel(0);
    buffer.init().unwrap();

    let decoded = buffer.decoded(0).unwrap();
    assert!(decoded.samples().is_empty());
    let cols = buffer.min_max_columns(0, 0.0, 32.0, 10).unwrap();
    assert_eq!(cols.len(), 10);
    for (lo, hi) in cols {
        // one full 1 Hz period per column
        assert!(lo < -9.0 && hi > 9.0, "column ({}, {})", lo, hi);
    }
}

#[test]
fn windowed_mode_reads_new_windows_on_demand() {
    let mut buffer = buffer(1, 4.0, 100);
    buffer.set_window_blocks(8);
    buffer.add_channel(0);
    buffer.init().unwrap();
    assert_eq!(buffer.decoded(0).unwrap().samples().len(), 8 * 4);

    let samples = buffer.samples(0, 200, 4).unwrap();
    let want: Vec<f32> = (200..204).map(|i| expected(0, 4.0, i)).collect();
    assert_eq!(samples, want);
    let decoded = buffer.decoded(0).unwrap();
    assert_eq!(decoded.first_record(), 50);
    assert_eq!(decoded.samples().len(), 8 * 4);
}

#[test]
fn window_at_recording_end_is_clipped() {
    let mut buffer = buffer(1, 4.0, 100);
    buffer.set_window_blocks(8);
    buffer.add_channel(0);
    let samples = buffer.samples(0, 396, 10).unwrap();
    assert_eq!(samples.len(), 4);
    assert_eq!(buffer.decoded(0).unwrap().first_record(), 99);
}

#[test]
fn min_max_search_covers_whole_recording() {
    let mut buffer = buffer(2, 16.0, 40);
    buffer.set_window_blocks(2);
    buffer.add_channel(1);
    buffer.init().unwrap();
    let (lo, hi) = buffer.channel_range(1);
    assert!((lo + 20.0).abs() < 1e-3 && (hi - 20.0).abs() < 1e-3, "range ({}, {})", lo, hi);
    assert_eq!(buffer.min_value(1), lo);
    assert_eq!(buffer.max_value(1), hi);
}

#[test]
fn default_range_without_search() {
    let mut buffer = buffer(1, 16.0, 40);
    buffer.enable_init_min_max_search(false);
    buffer.set_default_range(50.0, -50.0);
    buffer.add_channel(0);
    buffer.init().unwrap();
    assert_eq!(buffer.channel_range(0), (-50.0, 50.0));
    assert_eq!(buffer.channel_range(2), (-50.0, 50.0), "unbuffered channels use the default too");
}

#[test]
fn failed_init_leaves_decoded_state_untouched() {
    let reader = shared_reader(MemorySignalReader::synthetic(1, 8.0, 10, 1.0));
    let mut buffer = SignalBuffer::new(reader.clone()).unwrap();
    buffer.add_channel(0);
    buffer.init().unwrap();
    let before = buffer.decoded(0).unwrap().samples().to_vec();

    reader.lock().unwrap().close();
    assert_eq!(buffer.init(), Err(BufferInitError::NotOpen));
    assert_eq!(buffer.decoded(0).unwrap().samples(), &before[..]);
}

#[test]
fn failing_record_aborts_init() {
    let reader = shared_reader(MemorySignalReader::synthetic(1, 8.0, 10, 1.0).fail_from_record(Some(3)));
    let mut buffer = SignalBuffer::new(reader).unwrap();
    buffer.add_channel(0);
    let err = buffer.init().unwrap_err();
    assert!(matches!(err, BufferInitError::Records { start: 0, count: 10, .. }), "{:?}", err);
    assert!(err.to_string().contains("record 3 unreadable"));
    assert!(!buffer.has_data(0));
}

#[test]
fn cancelled_init_commits_nothing() {
    let mut buffer = buffer(1, 8.0, 10);
    buffer.add_channel(0);
    let cancel = CancelToken::new();
    cancel.cancel();
    let control = InitControl::new().with_cancel(cancel);
    assert_eq!(buffer.init_with(&control), Err(BufferInitError::Cancelled));
    assert!(!buffer.has_data(0));
}

#[test]
fn init_reports_progress_per_chunk() {
    let mut buffer = buffer(1, 8.0, 130);
    buffer.add_channel(0);
    let (tx, rx) = std::sync::mpsc::channel();
    buffer.init_with(&InitControl::new().with_progress(tx)).unwrap();
    let done: Vec<usize> = rx.try_iter().map(|p| p.records_done).collect();
    assert_eq!(done, vec![0, 64, 128, 130]);
}

#[test]
fn channel_bookkeeping() {
    let mut buffer = buffer(3, 8.0, 4);
    assert!(!buffer.add_channel(3));
    assert!(buffer.add_channel(2));
    assert!(buffer.add_channel(0));
    assert_eq!(buffer.buffered_channels(), vec![0, 2]);

    assert!(buffer.set_channel_active(2, false));
    assert!(!buffer.set_channel_active(1, false));
    assert_eq!(buffer.active_channels(), vec![0]);
    assert!(buffer.is_channel_buffered(2));

    buffer.init().unwrap();
    buffer.release();
    assert!(!buffer.has_data(0));
    assert!(buffer.remove_channel(2));
    assert!(!buffer.remove_channel(2));
}

#[test]
fn queries_on_unbuffered_channels_fail() {
    let mut buffer = buffer(2, 8.0, 4);
    assert_eq!(buffer.samples(1, 0, 4), Err(BufferError::ChannelNotBuffered(1)));
    assert_eq!(buffer.min_max_columns(1, 0.0, 2.0, 2), Err(BufferError::ChannelNotBuffered(1)));
}

#[test]
fn events_are_validated_and_loaded() {
    let reader = MemorySignalReader::synthetic(2, 8.0, 4, 1.0).with_events(vec![
        SignalEvent::new(1, 1, EventChannel::Channel(1), 1),
        SignalEvent::new(2, 1, EventChannel::Channel(9), 1),
        SignalEvent::new(3, 1, EventChannel::Undefined, 1),
    ]);
    let mut buffer = SignalBuffer::new(shared_reader(reader)).unwrap();
    assert_eq!(buffer.number_events(), 2);
    assert_eq!(buffer.event_sample_rate(), 8.0);

    let err = buffer.add_event(SignalEvent::new(0, 1, EventChannel::Channel(2), 0)).unwrap_err();
    assert_eq!(err, BufferError::InvalidEventChannel { channel: 2, channels: 2 });

    // a channel that is not buffered is still a valid event channel
    let id = buffer.add_event(SignalEvent::new(0, 1, EventChannel::Channel(0), 0)).unwrap();
    buffer.event_mut(id).unwrap().event_type = 5;
    assert_eq!(buffer.event(id).unwrap().event_type, 5);
}

#[test]
fn closed_reader_cannot_back_a_buffer() {
    let mut reader = MemorySignalReader::synthetic(1, 8.0, 4, 1.0);
    sigbrowse::SignalReader::close(&mut reader);
    assert!(matches!(SignalBuffer::new(shared_reader(reader)), Err(BufferInitError::NotOpen)));
}

#[test]
fn windowed_mode_builds_pyramid_over_whole_recording() {
    let mut buffer = buffer(1, 4.0, 100);
    buffer.set_window_blocks(8);
    buffer.enable_init_min_max_search(false);
    buffer.enable_init_downsampling(true);
    buffer.add_channel(0);
    assert_eq!(buffer.prepare_init().records_to_decode(), 100);
    buffer.init().unwrap();

    let decoded = buffer.decoded(0).unwrap();
    assert_eq!(decoded.samples().len(), 8 * 4, "only the window is kept");
    assert!(!decoded.pyramid().levels().is_empty());
    assert_eq!(decoded.pyramid().source_len(), 4 * 100);

    // zoomed out past the window: served from the pyramid, no new reads
    let cols = buffer.min_max_columns(0, 0.0, 40.0, 10).unwrap();
    assert_eq!(cols.len(), 10);
    assert_eq!(buffer.decoded(0).unwrap().first_record(), 0);
}
