//! Signal buffer: decoded and downsampled samples of the buffered channels
//! of one recording, plus its event table.
//!
//! A channel is *buffered* once [`SignalBuffer::add_channel`] was called and
//! until [`SignalBuffer::remove_channel`]. A buffered channel can have its
//! decoding suspended with [`SignalBuffer::set_channel_active`]; suspended
//! channels keep whatever data they already hold and are skipped by
//! [`SignalBuffer::init`].
//!
//! `init` is the only bulk-I/O path. It builds the new decoded state on the
//! side ([`InitRequest::run`]) and swaps it in ([`SignalBuffer::commit`]) only
//! on success, so a failing reader never leaves half-decoded channels behind.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::data::downsample::{self, MinMaxPyramid, PyramidBuilder, MAX_DOWNSAMPLING_FACTOR};
use crate::data::event::{EventChannel, EventId, EventTable, SignalEvent};
use crate::data::init_task::{InitControl, InitProgress};
use crate::error::{BufferError, BufferInitError};
use crate::reader::{BasicHeader, SharedReader, SignalDataBlock};

/// Records decoded per reader call during `init`.
pub const INIT_CHUNK_RECORDS: usize = 64;
/// Default number of records held per channel in [`WholeBufferMode::Windowed`].
pub const DEFAULT_WINDOW_BLOCKS: usize = 32;

/// How much of a channel `init` keeps in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WholeBufferMode {
    /// Only a window of records; other ranges are read on demand.
    #[default]
    Windowed,
    /// The min/max pyramid of the whole recording, no raw samples.
    Subsampled,
    /// Every raw sample plus the pyramid.
    Full,
}

/// Settings consulted by the next `init`.
#[derive(Debug, Clone, PartialEq)]
pub struct InitOptions {
    pub whole_buffer: WholeBufferMode,
    pub downsampling: bool,
    pub min_max_search: bool,
    pub window_blocks: usize,
}

impl Default for InitOptions {
    fn default() -> Self {
        Self {
            whole_buffer: WholeBufferMode::Windowed,
            downsampling: true,
            min_max_search: true,
            window_blocks: DEFAULT_WINDOW_BLOCKS,
        }
    }
}

/// Decoded state of one channel.
#[derive(Debug, Clone, Default)]
pub struct DecodedChannel {
    /// First record held in `samples`.
    first_record: usize,
    samples: Vec<f32>,
    /// Covers the whole recording; empty without downsampling.
    pyramid: MinMaxPyramid,
    /// Result of the min/max search over the whole recording.
    range: Option<(f32, f32)>,
}

impl DecodedChannel {
    pub fn first_record(&self) -> usize {
        self.first_record
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn pyramid(&self) -> &MinMaxPyramid {
        &self.pyramid
    }

    pub fn range(&self) -> Option<(f32, f32)> {
        self.range
    }
}

/// Output of [`InitRequest::run`], ready for [`SignalBuffer::commit`].
#[derive(Debug, Default)]
pub struct DecodedChannels {
    channels: Vec<(usize, DecodedChannel)>,
}

impl DecodedChannels {
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn channel_numbers(&self) -> Vec<usize> {
        self.channels.iter().map(|(ch, _)| *ch).collect()
    }
}

/// Snapshot of everything `init` needs. Can run on any thread.
#[derive(Clone)]
pub struct InitRequest {
    reader: SharedReader,
    header: BasicHeader,
    channels: Vec<usize>,
    options: InitOptions,
}

impl InitRequest {
    pub fn channels(&self) -> &[usize] {
        &self.channels
    }

    /// Number of records this request will read.
    pub fn records_to_decode(&self) -> usize {
        if self.channels.is_empty() {
            return 0;
        }
        match self.options.whole_buffer {
            WholeBufferMode::Windowed if !self.options.min_max_search && !self.options.downsampling => {
                self.options.window_blocks.min(self.header.number_records)
            }
            _ => self.header.number_records,
        }
    }

    /// Decode all requested channels.
    pub fn run(&self, control: &InitControl) -> Result<DecodedChannels, BufferInitError> {
        let total = self.records_to_decode();
        let window = self.options.window_blocks.min(self.header.number_records);
        let keep_records = match self.options.whole_buffer {
            WholeBufferMode::Full => total,
            WholeBufferMode::Windowed => window,
            WholeBufferMode::Subsampled => 0,
        };

        let mut reader = self.reader.lock().map_err(|_| BufferInitError::ReaderUnavailable)?;
        if !reader.is_open() {
            return Err(BufferInitError::NotOpen);
        }

        let mut kept: Vec<Vec<f32>> = vec![Vec::new(); self.channels.len()];
        let mut pyramids: Vec<Option<PyramidBuilder>> = self
            .channels
            .iter()
            .map(|_| self.options.downsampling.then(|| PyramidBuilder::new(MAX_DOWNSAMPLING_FACTOR)))
            .collect();
        let mut ranges: Vec<Option<(f32, f32)>> = vec![None; self.channels.len()];

        control.report(InitProgress {
            records_done: 0,
            records_total: total,
        });
        let mut start = 0;
        while start < total {
            if control.cancel.is_cancelled() {
                return Err(BufferInitError::Cancelled);
            }
            let count = INIT_CHUNK_RECORDS.min(total - start);
            let mut blocks: Vec<SignalDataBlock> =
                self.channels.iter().map(|&ch| SignalDataBlock::new(ch, count)).collect();
            reader
                .load_signals(&mut blocks, start)
                .map_err(|source| BufferInitError::Records { start, count, source })?;

            for (i, block) in blocks.iter().enumerate() {
                if self.options.min_max_search {
                    if let Some((lo, hi)) = downsample::min_max(&block.samples) {
                        ranges[i] = Some(match ranges[i] {
                            Some((a, b)) => (a.min(lo), b.max(hi)),
                            None => (lo, hi),
                        });
                    }
                }
                if start < keep_records {
                    let spr = self.samples_per_record(block.channel);
                    let keep = ((keep_records - start) * spr).min(block.samples.len());
                    kept[i].extend_from_slice(&block.samples[..keep]);
                }
                if let Some(builder) = pyramids[i].as_mut() {
                    builder.push(&block.samples);
                }
            }
            start += count;
            control.report(InitProgress {
                records_done: start,
                records_total: total,
            });
        }

        let channels = self
            .channels
            .iter()
            .enumerate()
            .map(|(i, &ch)| {
                let pyramid = pyramids[i].take().map(PyramidBuilder::finish).unwrap_or_default();
                let decoded = DecodedChannel {
                    first_record: 0,
                    samples: std::mem::take(&mut kept[i]),
                    pyramid,
                    range: ranges[i],
                };
                (ch, decoded)
            })
            .collect();
        Ok(DecodedChannels { channels })
    }

    fn samples_per_record(&self, channel: usize) -> usize {
        self.header.channel(channel).map(|c| c.samples_per_record).unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default)]
struct BufferedChannel {
    decoding: bool,
    data: Option<DecodedChannel>,
}

/// Decoded representation of one open recording.
pub struct SignalBuffer {
    reader: SharedReader,
    header: BasicHeader,
    channels: BTreeMap<usize, BufferedChannel>,
    events: EventTable,
    default_range: (f32, f32),
    options: InitOptions,
}

impl SignalBuffer {
    /// Bind a buffer to an open reader and load the file's events.
    pub fn new(reader: SharedReader) -> Result<Self, BufferInitError> {
        let (header, loaded) = {
            let mut guard = reader.lock().map_err(|_| BufferInitError::ReaderUnavailable)?;
            let header = guard.basic_header().cloned().ok_or(BufferInitError::NotOpen)?;
            let mut loaded = Vec::new();
            guard.load_events(&mut loaded);
            (header, loaded)
        };

        let mut events = EventTable::new();
        for event in loaded {
            match event.channel {
                EventChannel::Channel(ch) if ch >= header.number_channels() => {
                    log::warn!("SignalBuffer: dropping event at {} on invalid {}", event.position, event.channel);
                }
                _ => {
                    events.add(event);
                }
            }
        }

        Ok(Self {
            reader,
            header,
            channels: BTreeMap::new(),
            events,
            default_range: (-100.0, 100.0),
            options: InitOptions::default(),
        })
    }

    pub fn header(&self) -> &BasicHeader {
        &self.header
    }

    pub fn reader(&self) -> &SharedReader {
        &self.reader
    }

    // ── Configuration (read by the next init) ─────────────────────────────

    pub fn set_default_range(&mut self, min: f32, max: f32) {
        self.default_range = if min <= max { (min, max) } else { (max, min) };
    }

    pub fn default_range(&self) -> (f32, f32) {
        self.default_range
    }

    pub fn enable_init_downsampling(&mut self, enabled: bool) {
        self.options.downsampling = enabled;
    }

    pub fn enable_init_min_max_search(&mut self, enabled: bool) {
        self.options.min_max_search = enabled;
    }

    pub fn set_whole_data_buffer(&mut self, mode: WholeBufferMode) {
        self.options.whole_buffer = mode;
    }

    pub fn set_window_blocks(&mut self, blocks: usize) {
        self.options.window_blocks = blocks.max(1);
    }

    pub fn options(&self) -> &InitOptions {
        &self.options
    }

    // ── Channels ──────────────────────────────────────────────────────────

    /// Buffer `channel_nr` and resume its decoding. `false` for channel
    /// numbers outside the recording.
    pub fn add_channel(&mut self, channel_nr: usize) -> bool {
        if channel_nr >= self.header.number_channels() {
            return false;
        }
        self.channels.entry(channel_nr).or_default().decoding = true;
        true
    }

    /// Forget `channel_nr` and release its decoded data.
    pub fn remove_channel(&mut self, channel_nr: usize) -> bool {
        self.channels.remove(&channel_nr).is_some()
    }

    /// Suspend or resume decoding of a buffered channel. Data already
    /// decoded is kept either way.
    pub fn set_channel_active(&mut self, channel_nr: usize, active: bool) -> bool {
        match self.channels.get_mut(&channel_nr) {
            Some(entry) => {
                entry.decoding = active;
                true
            }
            None => false,
        }
    }

    pub fn is_channel_buffered(&self, channel_nr: usize) -> bool {
        self.channels.contains_key(&channel_nr)
    }

    /// Buffered and not suspended.
    pub fn is_channel_active(&self, channel_nr: usize) -> bool {
        self.channels.get(&channel_nr).is_some_and(|c| c.decoding)
    }

    pub fn buffered_channels(&self) -> Vec<usize> {
        self.channels.keys().copied().collect()
    }

    pub fn active_channels(&self) -> Vec<usize> {
        self.channels
            .iter()
            .filter(|(_, c)| c.decoding)
            .map(|(ch, _)| *ch)
            .collect()
    }

    pub fn decoded(&self, channel_nr: usize) -> Option<&DecodedChannel> {
        self.channels.get(&channel_nr).and_then(|c| c.data.as_ref())
    }

    pub fn has_data(&self, channel_nr: usize) -> bool {
        self.decoded(channel_nr).is_some()
    }

    /// Drop the decoded data of every channel, keeping the channel set.
    pub fn release(&mut self) {
        for entry in self.channels.values_mut() {
            entry.data = None;
        }
    }

    // ── Init ──────────────────────────────────────────────────────────────

    pub fn prepare_init(&self) -> InitRequest {
        InitRequest {
            reader: self.reader.clone(),
            header: self.header.clone(),
            channels: self.active_channels(),
            options: self.options.clone(),
        }
    }

    /// Install freshly decoded channels. Channels removed while the request
    /// was running are skipped.
    pub fn commit(&mut self, decoded: DecodedChannels) {
        for (ch, data) in decoded.channels {
            if let Some(entry) = self.channels.get_mut(&ch) {
                entry.data = Some(data);
            }
        }
    }

    /// Rebuild the decoded state of every active channel. Blocks.
    pub fn init(&mut self) -> Result<(), BufferInitError> {
        self.init_with(&InitControl::default())
    }

    pub fn init_with(&mut self, control: &InitControl) -> Result<(), BufferInitError> {
        let decoded = self.prepare_init().run(control)?;
        log::debug!("SignalBuffer::init decoded {} channel(s)", decoded.len());
        self.commit(decoded);
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────────────────

    /// Seconds per block (= per record).
    pub fn block_duration(&self) -> f64 {
        self.header.record_duration
    }

    pub fn number_blocks(&self) -> usize {
        self.header.number_records
    }

    /// Display range of a channel: the searched min/max when available,
    /// else the default range.
    pub fn channel_range(&self, channel_nr: usize) -> (f32, f32) {
        self.decoded(channel_nr)
            .and_then(|d| d.range.or_else(|| d.pyramid.min_max()))
            .unwrap_or(self.default_range)
    }

    pub fn min_value(&self, channel_nr: usize) -> f32 {
        self.channel_range(channel_nr).0
    }

    pub fn max_value(&self, channel_nr: usize) -> f32 {
        self.channel_range(channel_nr).1
    }

    /// Raw samples `start .. start + len` of a buffered channel, clipped to
    /// the recording. Reads a new window through the reader when the range
    /// is not held in memory.
    pub fn samples(&mut self, channel_nr: usize, start: usize, len: usize) -> Result<Vec<f32>, BufferError> {
        let spr = self.samples_per_record(channel_nr);
        let total = spr * self.header.number_records;
        let start = start.min(total);
        let end = start.saturating_add(len).min(total);
        if start == end {
            return Ok(Vec::new());
        }
        self.ensure_window(channel_nr, start, end)?;
        let data = self.decoded(channel_nr).ok_or(BufferError::NoData(channel_nr))?;
        let offset = data.first_record * spr;
        Ok(data.samples[start - offset..end - offset].to_vec())
    }

    /// One (min, max) pair per pixel column, starting at `start_sample` with
    /// `samples_per_column` samples per column. Uses the pyramid when one
    /// of its levels is coarse enough, raw samples otherwise. Columns left of
    /// sample 0 come back as `(NaN, NaN)`.
    pub fn min_max_columns(
        &mut self,
        channel_nr: usize,
        start_sample: f64,
        samples_per_column: f64,
        columns: usize,
    ) -> Result<Vec<(f32, f32)>, BufferError> {
        if !self.is_channel_buffered(channel_nr) {
            return Err(BufferError::ChannelNotBuffered(channel_nr));
        }
        if let Some(cols) = self
            .decoded(channel_nr)
            .and_then(|d| d.pyramid.columns(start_sample, samples_per_column, columns))
        {
            return Ok(cols);
        }
        let start = start_sample.max(0.0).floor() as usize;
        let len = (samples_per_column * columns as f64).ceil() as usize + 1;
        let samples = self.samples(channel_nr, start, len)?;
        Ok(downsample::raw_columns(
            &samples,
            start_sample - start as f64,
            samples_per_column,
            columns,
        ))
    }

    fn samples_per_record(&self, channel_nr: usize) -> usize {
        self.header.channel(channel_nr).map(|c| c.samples_per_record).unwrap_or(0)
    }

    /// Make sure samples `start..end` of the channel are in memory.
    fn ensure_window(&mut self, channel_nr: usize, start: usize, end: usize) -> Result<(), BufferError> {
        let spr = self.samples_per_record(channel_nr).max(1);
        let entry = self
            .channels
            .get(&channel_nr)
            .ok_or(BufferError::ChannelNotBuffered(channel_nr))?;
        if let Some(data) = &entry.data {
            let held_from = data.first_record * spr;
            let held_to = held_from + data.samples.len();
            if start >= held_from && end <= held_to {
                return Ok(());
            }
        }

        let first_record = start / spr;
        let needed = end.div_ceil(spr) - first_record;
        let records = needed
            .max(self.options.window_blocks)
            .min(self.header.number_records - first_record);
        let mut blocks = [SignalDataBlock::new(channel_nr, records)];
        {
            let mut reader = self.reader.lock().map_err(|_| BufferError::ReaderUnavailable)?;
            reader.load_signals(&mut blocks, first_record)?;
        }
        let [block] = blocks;
        log::debug!(
            "SignalBuffer: channel {} window records {}..{}",
            channel_nr,
            first_record,
            first_record + records
        );

        let entry = self
            .channels
            .get_mut(&channel_nr)
            .ok_or(BufferError::ChannelNotBuffered(channel_nr))?;
        let data = entry.data.get_or_insert_with(DecodedChannel::default);
        data.first_record = first_record;
        data.samples = block.samples;
        Ok(())
    }

    // ── Events ────────────────────────────────────────────────────────────

    /// Store a new event. Its channel must be UNDEFINED_CHANNEL or a channel
    /// of the recording (shown or not).
    pub fn add_event(&mut self, event: SignalEvent) -> Result<EventId, BufferError> {
        if let EventChannel::Channel(ch) = event.channel {
            if ch >= self.header.number_channels() {
                return Err(BufferError::InvalidEventChannel {
                    channel: ch,
                    channels: self.header.number_channels(),
                });
            }
        }
        Ok(self.events.add(event))
    }

    pub fn remove_event(&mut self, id: EventId) -> Option<SignalEvent> {
        self.events.remove(id)
    }

    pub fn event(&self, id: EventId) -> Option<&SignalEvent> {
        self.events.get(id)
    }

    pub fn event_mut(&mut self, id: EventId) -> Option<&mut SignalEvent> {
        self.events.get_mut(id)
    }

    /// Id of the `ordinal`-th event in insertion order.
    pub fn event_number_to_id(&self, ordinal: usize) -> Option<EventId> {
        self.events.number_to_id(ordinal)
    }

    pub fn number_events(&self) -> usize {
        self.events.len()
    }

    pub fn events(&self) -> &EventTable {
        &self.events
    }

    pub fn event_sample_rate(&self) -> f64 {
        self.header.event_sample_rate
    }
}
