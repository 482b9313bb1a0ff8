//! Signal reader capability and recording metadata.
//!
//! Concrete file formats (CNT, BKR, EDF, ...) live outside this crate and
//! plug in through [`SignalReader`]. [`MemorySignalReader`] serves recordings
//! that are already in memory (generated data, tests, network captures).

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::NaiveDateTime;

use crate::data::event::SignalEvent;
use crate::error::ReaderError;

/// Descriptor of one recorded channel.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalChannel {
    /// Zero-based channel number inside the recording.
    pub number: usize,
    pub label: String,
    /// Physical unit, e.g. "uV".
    pub physical_dim: String,
    pub physical_min: f64,
    pub physical_max: f64,
    pub sample_rate: f64,
    pub samples_per_record: usize,
}

impl SignalChannel {
    pub fn new(number: usize, label: impl Into<String>, sample_rate: f64, samples_per_record: usize) -> Self {
        Self {
            number,
            label: label.into(),
            physical_dim: String::new(),
            physical_min: -1.0,
            physical_max: 1.0,
            sample_rate,
            samples_per_record,
        }
    }
}

/// Recording metadata. Immutable once a file is opened.
#[derive(Debug, Clone, PartialEq)]
pub struct BasicHeader {
    pub file_path: PathBuf,
    pub number_records: usize,
    /// Duration of one record (= one buffer block) in seconds.
    pub record_duration: f64,
    /// Rate used to express event positions and durations.
    pub event_sample_rate: f64,
    pub recording_time: Option<NaiveDateTime>,
    pub channels: Vec<SignalChannel>,
}

impl BasicHeader {
    pub fn number_channels(&self) -> usize {
        self.channels.len()
    }

    pub fn channel(&self, channel_nr: usize) -> Option<&SignalChannel> {
        self.channels.get(channel_nr)
    }

    /// Highest channel sample rate, or the event rate for a channel-less file.
    pub fn sample_rate(&self) -> f64 {
        self.channels
            .iter()
            .map(|c| c.sample_rate)
            .fold(None, |acc: Option<f64>, r| Some(acc.map_or(r, |a| a.max(r))))
            .unwrap_or(self.event_sample_rate)
    }

    /// Total recording length in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.number_records as f64 * self.record_duration
    }
}

/// A request for the samples of one channel, filled by [`SignalReader::load_signals`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignalDataBlock {
    pub channel: usize,
    /// Number of records to load into `samples`.
    pub records: usize,
    pub samples: Vec<f32>,
}

impl SignalDataBlock {
    pub fn new(channel: usize, records: usize) -> Self {
        Self {
            channel,
            records,
            samples: Vec::new(),
        }
    }
}

/// Format-independent access to a recording.
pub trait SignalReader: Send {
    fn open(&mut self, path: &Path) -> Result<(), ReaderError>;
    fn is_open(&self) -> bool;
    fn close(&mut self);

    /// Metadata of the open file, `None` when closed.
    fn basic_header(&self) -> Option<&BasicHeader>;

    /// Load `records` records of every channel starting at `start_record`.
    /// `record_data[ch]` is replaced with the channel's samples.
    fn load_raw_records(
        &mut self,
        record_data: &mut Vec<Vec<f32>>,
        start_record: usize,
        records: usize,
    ) -> Result<(), ReaderError>;

    /// Fill each block with `block.records` records of `block.channel`.
    fn load_signals(&mut self, blocks: &mut [SignalDataBlock], start_record: usize) -> Result<(), ReaderError> {
        let records = blocks.iter().map(|b| b.records).max().unwrap_or(0);
        if records == 0 {
            return Ok(());
        }
        let mut raw = Vec::new();
        self.load_raw_records(&mut raw, start_record, records)?;
        for block in blocks.iter_mut() {
            let channel = raw.get(block.channel).ok_or(ReaderError::NoSuchChannel(block.channel))?;
            let spr = self
                .basic_header()
                .and_then(|h| h.channel(block.channel))
                .map(|c| c.samples_per_record)
                .unwrap_or(0);
            let take = (spr * block.records).min(channel.len());
            block.samples.clear();
            block.samples.extend_from_slice(&channel[..take]);
        }
        Ok(())
    }

    /// Events stored in the file. Formats without events leave `events` untouched.
    fn load_events(&mut self, _events: &mut Vec<SignalEvent>) {}
}

/// Reader shared between the buffer and an init worker thread.
pub type SharedReader = Arc<Mutex<Box<dyn SignalReader>>>;

pub fn shared_reader<R: SignalReader + 'static>(reader: R) -> SharedReader {
    Arc::new(Mutex::new(Box::new(reader)))
}

// ─────────────────────────────────────────────────────────────────────────────
// MemorySignalReader
// ─────────────────────────────────────────────────────────────────────────────

/// Reader over samples held in memory.
pub struct MemorySignalReader {
    header: BasicHeader,
    data: Vec<Vec<f32>>,
    events: Vec<SignalEvent>,
    open: bool,
    fail_from_record: Option<usize>,
    raw_loads: usize,
}

impl MemorySignalReader {
    /// `data[ch]` must hold `number_records * samples_per_record` samples;
    /// shorter channels are zero-padded on load.
    pub fn new(header: BasicHeader, data: Vec<Vec<f32>>) -> Self {
        Self {
            header,
            data,
            events: Vec::new(),
            open: true,
            fail_from_record: None,
            raw_loads: 0,
        }
    }

    /// Channels of sine waves with increasing frequency (1 Hz, 2 Hz, ...)
    /// and amplitude `10 * (ch + 1)`.
    pub fn synthetic(channels: usize, sample_rate: f64, records: usize, record_duration: f64) -> Self {
        let spr = (sample_rate * record_duration).round().max(1.0) as usize;
        let total = spr * records;
        let descs = (0..channels)
            .map(|ch| {
                let amplitude = 10.0 * (ch + 1) as f64;
                SignalChannel {
                    number: ch,
                    label: format!("Ch {}", ch + 1),
                    physical_dim: "uV".to_string(),
                    physical_min: -amplitude,
                    physical_max: amplitude,
                    sample_rate,
                    samples_per_record: spr,
                }
            })
            .collect();
        let data = (0..channels)
            .map(|ch| {
                let freq = (ch + 1) as f64;
                let amplitude = 10.0 * (ch + 1) as f64;
                (0..total)
                    .map(|i| {
                        let t = i as f64 / sample_rate;
                        (amplitude * (2.0 * std::f64::consts::PI * freq * t).sin()) as f32
                    })
                    .collect()
            })
            .collect();
        let header = BasicHeader {
            file_path: PathBuf::from("<memory>"),
            number_records: records,
            record_duration,
            event_sample_rate: sample_rate,
            recording_time: None,
            channels: descs,
        };
        Self::new(header, data)
    }

    pub fn with_events(mut self, events: Vec<SignalEvent>) -> Self {
        self.events = events;
        self
    }

    pub fn with_recording_time(mut self, start: NaiveDateTime) -> Self {
        self.header.recording_time = Some(start);
        self
    }

    /// Make every load touching `record` or later fail.
    pub fn fail_from_record(mut self, record: Option<usize>) -> Self {
        self.fail_from_record = record;
        self
    }

    pub fn set_fail_from_record(&mut self, record: Option<usize>) {
        self.fail_from_record = record;
    }

    /// Number of `load_raw_records` calls served so far.
    pub fn raw_loads(&self) -> usize {
        self.raw_loads
    }
}

impl SignalReader for MemorySignalReader {
    fn open(&mut self, path: &Path) -> Result<(), ReaderError> {
        self.header.file_path = path.to_path_buf();
        self.open = true;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn close(&mut self) {
        self.open = false;
    }

    fn basic_header(&self) -> Option<&BasicHeader> {
        self.open.then_some(&self.header)
    }

    fn load_raw_records(
        &mut self,
        record_data: &mut Vec<Vec<f32>>,
        start_record: usize,
        records: usize,
    ) -> Result<(), ReaderError> {
        if !self.open {
            return Err(ReaderError::NotOpen);
        }
        let end = start_record + records;
        if end > self.header.number_records {
            return Err(ReaderError::OutOfRange {
                start: start_record,
                end,
                available: self.header.number_records,
            });
        }
        if let Some(fail) = self.fail_from_record {
            if end > fail {
                return Err(ReaderError::Io(format!("record {} unreadable", fail.max(start_record))));
            }
        }
        self.raw_loads += 1;
        record_data.resize_with(self.header.channels.len(), Vec::new);
        for (ch, out) in record_data.iter_mut().enumerate() {
            let spr = self.header.channels[ch].samples_per_record;
            let from = start_record * spr;
            let to = end * spr;
            out.clear();
            out.reserve(to - from);
            let src = self.data.get(ch).map(|v| v.as_slice()).unwrap_or(&[]);
            for i in from..to {
                out.push(src.get(i).copied().unwrap_or(0.0));
            }
        }
        Ok(())
    }

    fn load_events(&mut self, events: &mut Vec<SignalEvent>) {
        events.extend(self.events.iter().cloned());
    }
}
