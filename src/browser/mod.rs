//! Signal browser model.
//!
//! Mediates between a [`SignalBuffer`] and a [`BrowserView`]: it decides which
//! channels are shown, where every channel row and event sits, and when the
//! buffer gets re-initialized.
//!
//! Mutating operations are guarded: they need an attached view and the
//! [`BrowserState::Ready`] state. A rejected call is a logged no-op. The log
//! line goes through the `log` facade and, if set, the [`LogSink`].
//!
//! Channel bookkeeping lives in two places:
//! - the [`ChannelRegistry`] holds the *shown* channels (with their items),
//! - the buffer holds the *buffered* channels, whose decoding may be suspended.
//!
//! Every shown channel is buffered. Buffered channels need not be shown
//! (a removed channel keeps its data unless the release-buffer policy is on).

pub mod background;
pub mod event_item;
pub mod layout;
pub mod registry;
pub mod signal_item;
pub mod view;

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::config::BrowserSettings;
use crate::data::buffer::{DecodedChannels, InitRequest, SignalBuffer, WholeBufferMode};
use crate::data::event::{EventChannel, EventId, SignalEvent};
use crate::data::init_task::{CancelToken, InitControl};
use crate::diagnostics::LogSink;
use crate::error::{BrowserError, BufferInitError, PreconditionError};
use crate::reader::{BasicHeader, SharedReader};

pub use background::InitTask;
pub use event_item::EventItem;
pub use layout::LayoutState;
pub use registry::ChannelRegistry;
pub use signal_item::{ScaleMode, SignalItem, DEFAULT_RANGE_FACTOR};
pub use view::BrowserView;

/// Rendering/ownership state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BrowserState {
    Ready,
    /// The buffer is being (re)built; only `finish_init_buffer` and
    /// `abort_init_buffer` are accepted.
    InitBuffer,
    /// The last init failed. Only `init_buffer` is accepted.
    InitFailed,
}

/// Interaction mode of the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BrowserMode {
    Pointer,
    /// Dragging creates a new event.
    NewEvent,
    Hand,
    ShiftSignal,
    Zoom,
}

/// What kind of event is selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectionState {
    None,
    OneChannel,
    AllChannels,
}

pub struct SignalBrowserModel {
    view: Option<Box<dyn BrowserView>>,
    log_sink: Option<Box<dyn LogSink>>,
    state: BrowserState,
    mode: BrowserMode,
    buffer: SignalBuffer,
    registry: ChannelRegistry,
    release_buffer: bool,
    layout: LayoutState,
    auto_zoom: ScaleMode,
    channel_y_pos: HashMap<EventChannel, i32>,
    event_items: BTreeMap<EventId, EventItem>,
    shown_event_types: BTreeSet<u16>,
    all_event_types_selected: bool,
    selected_event: Option<EventId>,
    actual_event_creation_type: Option<u16>,
    last_init_error: Option<BufferInitError>,
    pending_init: Option<CancelToken>,
}

impl SignalBrowserModel {
    /// Create a model for the file open in `reader`.
    pub fn new(reader: SharedReader) -> Result<Self, BufferInitError> {
        let buffer = SignalBuffer::new(reader)?;
        Ok(Self::with_buffer(buffer))
    }

    pub fn with_buffer(buffer: SignalBuffer) -> Self {
        Self {
            view: None,
            log_sink: None,
            state: BrowserState::Ready,
            mode: BrowserMode::Pointer,
            buffer,
            registry: ChannelRegistry::new(),
            release_buffer: false,
            layout: LayoutState::default(),
            auto_zoom: ScaleMode::MinToMax,
            channel_y_pos: HashMap::new(),
            event_items: BTreeMap::new(),
            shown_event_types: BTreeSet::new(),
            all_event_types_selected: true,
            selected_event: None,
            actual_event_creation_type: None,
            last_init_error: None,
            pending_init: None,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Collaborators
    // ─────────────────────────────────────────────────────────────────────────

    pub fn set_view(&mut self, view: Box<dyn BrowserView>) {
        self.view = Some(view);
    }

    pub fn take_view(&mut self) -> Option<Box<dyn BrowserView>> {
        self.view.take()
    }

    pub fn has_view(&self) -> bool {
        self.view.is_some()
    }

    pub fn set_log_sink(&mut self, sink: Box<dyn LogSink>) {
        self.log_sink = Some(sink);
    }

    pub fn clear_log_sink(&mut self) {
        self.log_sink = None;
    }

    pub fn buffer(&self) -> &SignalBuffer {
        &self.buffer
    }

    pub fn header(&self) -> &BasicHeader {
        self.buffer.header()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Guard and diagnostics
    // ─────────────────────────────────────────────────────────────────────────

    /// Checks every guarded operation runs first.
    pub fn guard(&self, op: &'static str) -> Result<(), PreconditionError> {
        self.guard_states(op, &[BrowserState::Ready])
    }

    fn guard_states(&self, op: &'static str, allowed: &[BrowserState]) -> Result<(), PreconditionError> {
        if self.view.is_none() {
            return Err(PreconditionError::NoView { op });
        }
        if !allowed.contains(&self.state) {
            return Err(PreconditionError::IllegalState { op, state: self.state });
        }
        Ok(())
    }

    fn accept(&mut self, op: &'static str) -> bool {
        match self.guard(op) {
            Ok(()) => true,
            Err(e) => {
                self.report(op, e.into());
                false
            }
        }
    }

    fn report(&mut self, op: &str, err: BrowserError) {
        let line = format!("SignalBrowserModel::{} Error: {}", op, err);
        match err {
            BrowserError::BufferInit(_) => log::error!("{}", line),
            _ => log::warn!("{}", line),
        }
        if let Some(sink) = self.log_sink.as_mut() {
            sink.write_line(&line);
        }
    }

    fn check_positive(&mut self, op: &'static str, name: &'static str, value: f64) -> bool {
        if value > 0.0 && value.is_finite() {
            true
        } else {
            self.report(op, BrowserError::InvalidParameter { name, value });
            false
        }
    }

    /// Rejects row sizes whose scene height would overflow with every
    /// channel of the recording shown.
    fn check_rows_fit(&mut self, op: &'static str, name: &'static str, value: i32, height: i32, spacing: i32) -> bool {
        let channels = self.buffer.header().number_channels();
        if LayoutState::rows_fit(height, spacing, channels) {
            true
        } else {
            self.report(op, BrowserError::InvalidParameter { name, value: value as f64 });
            false
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // State and mode
    // ─────────────────────────────────────────────────────────────────────────

    pub fn state(&self) -> BrowserState {
        self.state
    }

    pub fn mode(&self) -> BrowserMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: BrowserMode) {
        if !self.accept("setMode") {
            return;
        }
        self.mode = mode;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Buffer configuration (takes effect at the next init)
    // ─────────────────────────────────────────────────────────────────────────

    pub fn set_whole_data_buffer(&mut self, mode: WholeBufferMode) {
        self.buffer.set_whole_data_buffer(mode);
    }

    pub fn enable_init_downsampling(&mut self, enabled: bool) {
        self.buffer.enable_init_downsampling(enabled);
    }

    pub fn enable_init_min_max_search(&mut self, enabled: bool) {
        self.buffer.enable_init_min_max_search(enabled);
    }

    pub fn set_default_range(&mut self, min: f32, max: f32) {
        self.buffer.set_default_range(min, max);
    }

    pub fn set_release_buffer(&mut self, release: bool) {
        self.release_buffer = release;
    }

    pub fn release_buffer(&self) -> bool {
        self.release_buffer
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Channels
    // ─────────────────────────────────────────────────────────────────────────

    /// Show a channel. Layout is not recomputed; call `init_buffer` and/or
    /// `update_layout` afterwards.
    pub fn add_channel(&mut self, channel_nr: usize) {
        if !self.accept("addChannel") {
            return;
        }
        let channels = self.buffer.header().number_channels();
        let Some(channel) = self.buffer.header().channel(channel_nr).cloned() else {
            self.report("addChannel", BrowserError::InvalidChannel { channel: channel_nr, channels });
            return;
        };
        if self.registry.contains(channel_nr) {
            log::debug!("SignalBrowserModel::addChannel already added channel {}", channel_nr);
            return;
        }

        let item = SignalItem::new(channel, self.layout.signal_height);
        if let Some(view) = self.view.as_mut() {
            view.y_axis_add_channel(channel_nr, &item);
        }
        self.registry.add(channel_nr, item);
        self.buffer.add_channel(channel_nr);
    }

    /// Hide a channel. With the release-buffer policy its decoded data is
    /// dropped; otherwise it stays buffered with decoding suspended.
    pub fn remove_channel(&mut self, channel_nr: usize) {
        if !self.accept("removeChannel") {
            return;
        }
        if self.registry.remove(channel_nr).is_none() {
            return;
        }
        if let Some(view) = self.view.as_mut() {
            view.remove_signal_item(channel_nr);
            view.y_axis_remove_channel(channel_nr);
        }
        if self.release_buffer {
            self.buffer.remove_channel(channel_nr);
        } else {
            self.buffer.set_channel_active(channel_nr, false);
        }
    }

    pub fn is_channel_shown(&self, channel_nr: usize) -> bool {
        self.registry.contains(channel_nr)
    }

    pub fn number_shown_channels(&self) -> usize {
        self.registry.len()
    }

    /// Shown channels in display order.
    pub fn shown_channels(&self) -> Vec<usize> {
        self.registry.channels()
    }

    /// Channel number shown in display row `shown_nr`.
    pub fn channel_nr(&self, shown_nr: usize) -> Option<usize> {
        self.registry.channel_at(shown_nr)
    }

    pub fn signal_item(&self, channel_nr: usize) -> Option<&SignalItem> {
        self.registry.get(channel_nr)
    }

    /// Y position assigned by the last layout pass.
    pub fn channel_y_pos(&self, channel: EventChannel) -> Option<i32> {
        self.channel_y_pos.get(&channel).copied()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Buffer initialization
    // ─────────────────────────────────────────────────────────────────────────

    /// Re-initialize the buffer for the shown channels. Blocks until done.
    /// Also the way out of [`BrowserState::InitFailed`].
    pub fn init_buffer(&mut self) {
        let Some(request) = self.begin_init("initBuffer") else {
            return;
        };
        let result = request.run(&InitControl::default());
        self.complete_init(result);
    }

    /// Like `init_buffer` but decodes on a worker thread. The model stays in
    /// [`BrowserState::InitBuffer`] until the task is handed to
    /// [`Self::finish_init_buffer`] or dropped through
    /// [`Self::abort_init_buffer`].
    pub fn start_init_buffer(&mut self) -> Option<InitTask> {
        let request = self.begin_init("startInitBuffer")?;
        match InitTask::spawn(request) {
            Ok(task) => {
                self.pending_init = Some(task.cancel_token());
                Some(task)
            }
            Err(e) => {
                self.complete_init(Err(e));
                None
            }
        }
    }

    /// Wait for `task` and commit its result. The model always leaves
    /// [`BrowserState::InitBuffer`], even with the view detached.
    pub fn finish_init_buffer(&mut self, task: InitTask) {
        if self.state != BrowserState::InitBuffer {
            let state = self.state;
            task.cancel();
            self.report(
                "finishInitBuffer",
                PreconditionError::IllegalState {
                    op: "finishInitBuffer",
                    state,
                }
                .into(),
            );
            return;
        }
        if self.view.is_none() {
            self.report("finishInitBuffer", PreconditionError::NoView { op: "finishInitBuffer" }.into());
        }
        let result = task.wait();
        self.complete_init(result);
    }

    /// Give up on a background init whose task was lost. The worker is
    /// cancelled and the previous data is kept.
    pub fn abort_init_buffer(&mut self) {
        if self.state != BrowserState::InitBuffer {
            let state = self.state;
            self.report(
                "abortInitBuffer",
                PreconditionError::IllegalState {
                    op: "abortInitBuffer",
                    state,
                }
                .into(),
            );
            return;
        }
        if let Some(token) = self.pending_init.as_ref() {
            token.cancel();
        }
        self.complete_init(Err(BufferInitError::Cancelled));
    }

    pub fn last_init_error(&self) -> Option<&BufferInitError> {
        self.last_init_error.as_ref()
    }

    fn begin_init(&mut self, op: &'static str) -> Option<InitRequest> {
        if let Err(e) = self.guard_states(op, &[BrowserState::Ready, BrowserState::InitFailed]) {
            self.report(op, e.into());
            return None;
        }
        for ch in self.registry.channels() {
            self.buffer.set_channel_active(ch, true);
        }
        self.state = BrowserState::InitBuffer;
        if let Some(view) = self.view.as_mut() {
            view.set_visible(false);
            view.set_busy(true);
        }
        Some(self.buffer.prepare_init())
    }

    fn complete_init(&mut self, result: Result<DecodedChannels, BufferInitError>) {
        self.pending_init = None;
        if let Some(view) = self.view.as_mut() {
            view.set_busy(false);
        }
        match result {
            Ok(decoded) => {
                self.buffer.commit(decoded);
                self.state = BrowserState::Ready;
                self.last_init_error = None;
                for (_, item) in self.registry.iter_mut() {
                    item.range_from_buffer(&self.buffer, DEFAULT_RANGE_FACTOR);
                }
                self.sync_event_items();
                if let Some(view) = self.view.as_mut() {
                    view.set_visible(true);
                }
                log::info!(
                    "SignalBrowserModel: buffer initialized for {} channel(s)",
                    self.registry.len()
                );
            }
            Err(BufferInitError::Cancelled) => {
                self.state = BrowserState::Ready;
                if let Some(view) = self.view.as_mut() {
                    view.set_visible(true);
                }
                log::info!("SignalBrowserModel: buffer initialization cancelled, keeping previous data");
            }
            Err(e) => {
                self.state = BrowserState::InitFailed;
                self.last_init_error = Some(e.clone());
                self.report("initBuffer", e.into());
            }
        }
    }

    /// Create items for buffer events that do not have one yet.
    fn sync_event_items(&mut self) {
        for ordinal in 0..self.buffer.number_events() {
            if let Some(id) = self.buffer.event_number_to_id(ordinal) {
                self.event_items.entry(id).or_insert_with(|| EventItem::new(id));
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Vertical scaling
    // ─────────────────────────────────────────────────────────────────────────

    pub fn zoom_in_all(&mut self) {
        if !self.accept("zoomInAll") {
            return;
        }
        for (_, item) in self.registry.iter_mut() {
            item.zoom_in();
        }
        self.push_items_and_update();
    }

    pub fn zoom_out_all(&mut self) {
        if !self.accept("zoomOutAll") {
            return;
        }
        for (_, item) in self.registry.iter_mut() {
            item.zoom_out();
        }
        self.push_items_and_update();
    }

    pub fn auto_scale_all(&mut self) {
        if !self.accept("autoScaleAll") {
            return;
        }
        let mode = self.auto_zoom;
        for (_, item) in self.registry.iter_mut() {
            item.auto_scale(&self.buffer, mode);
        }
        self.push_items_and_update();
    }

    pub fn set_auto_zoom_behaviour(&mut self, mode: ScaleMode) {
        self.auto_zoom = mode;
    }

    pub fn auto_zoom_behaviour(&self) -> ScaleMode {
        self.auto_zoom
    }

    fn push_items_and_update(&mut self) {
        let preferred = self.layout.preferred_y_grid_pixel_interval;
        if let Some(view) = self.view.as_mut() {
            for (ch, item) in self.registry.iter_mut() {
                item.update_y_grid_interval(preferred);
                view.add_signal_item(ch, item);
            }
            view.update();
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Layout
    // ─────────────────────────────────────────────────────────────────────────

    pub fn layout(&self) -> &LayoutState {
        &self.layout
    }

    pub fn set_pixel_per_sec(&mut self, pixel_per_sec: f64) {
        if !self.accept("setPixelPerSec") || !self.check_positive("setPixelPerSec", "pixel_per_sec", pixel_per_sec) {
            return;
        }
        let old = self.layout.pixel_per_sec;
        self.layout.pixel_per_sec = pixel_per_sec;
        self.update_layout();
        if let Some(view) = self.view.as_mut() {
            let (x, y) = view.contents_pos();
            view.set_contents_pos((x as f64 * pixel_per_sec / old) as i32, y);
        }
    }

    pub fn pixel_per_sec(&self) -> f64 {
        self.layout.pixel_per_sec
    }

    pub fn set_signal_height(&mut self, height: i32) {
        if !self.accept("setSignalHeight") || !self.check_positive("setSignalHeight", "signal_height", height as f64) {
            return;
        }
        if !self.check_rows_fit("setSignalHeight", "signal_height", height, height, self.layout.signal_spacing) {
            return;
        }
        let old_pitch = self.layout.row_pitch();
        self.layout.signal_height = height;
        self.update_layout();
        let new_pitch = self.layout.row_pitch();
        if let Some(view) = self.view.as_mut() {
            let (x, y) = view.contents_pos();
            if old_pitch > 0 {
                view.set_contents_pos(x, (y as f64 * new_pitch as f64 / old_pitch as f64) as i32);
            }
        }
    }

    pub fn signal_height(&self) -> i32 {
        self.layout.signal_height
    }

    pub fn set_signal_spacing(&mut self, spacing: i32) {
        if !self.accept("setSignalSpacing") {
            return;
        }
        if spacing < 0 {
            self.report(
                "setSignalSpacing",
                BrowserError::InvalidParameter {
                    name: "signal_spacing",
                    value: spacing as f64,
                },
            );
            return;
        }
        if !self.check_rows_fit("setSignalSpacing", "signal_spacing", spacing, self.layout.signal_height, spacing) {
            return;
        }
        self.layout.signal_spacing = spacing;
        self.update_layout();
    }

    pub fn signal_spacing(&self) -> i32 {
        self.layout.signal_spacing
    }

    pub fn set_preferred_x_grid_pixel_interval(&mut self, pixel_interval: i32) {
        if !self.accept("setPreferedXGirdPixelIntervall")
            || !self.check_positive("setPreferedXGirdPixelIntervall", "x_grid_pixel_interval", pixel_interval as f64)
        {
            return;
        }
        self.layout.preferred_x_grid_pixel_interval = pixel_interval;
        self.update_layout();
    }

    pub fn preferred_x_grid_pixel_interval(&self) -> i32 {
        self.layout.preferred_x_grid_pixel_interval
    }

    pub fn set_preferred_y_grid_pixel_interval(&mut self, pixel_interval: i32) {
        if !self.accept("setPreferedYGirdPixelIntervall")
            || !self.check_positive("setPreferedYGirdPixelIntervall", "y_grid_pixel_interval", pixel_interval as f64)
        {
            return;
        }
        self.layout.preferred_y_grid_pixel_interval = pixel_interval;
        self.update_layout();
    }

    pub fn preferred_y_grid_pixel_interval(&self) -> i32 {
        self.layout.preferred_y_grid_pixel_interval
    }

    pub fn x_grid_pixel_interval(&self) -> f64 {
        self.layout.x_grid_pixel_interval
    }

    pub fn show_x_scales(&mut self, enabled: bool) {
        self.layout.show_x_scales = enabled;
    }

    pub fn show_y_scales(&mut self, enabled: bool) {
        self.layout.show_y_scales = enabled;
    }

    pub fn show_channel_labels(&mut self, enabled: bool) {
        self.layout.show_channel_labels = enabled;
    }

    pub fn set_x_grid_visible(&mut self, visible: bool) {
        self.layout.show_x_grid = visible;
    }

    pub fn set_y_grid_visible(&mut self, visible: bool) {
        self.layout.show_y_grid = visible;
    }

    /// Full layout pass: scene size, channel rows, event items, x grid.
    pub fn update_layout(&mut self) {
        if self.view.is_none() {
            self.report("updateLayout", PreconditionError::NoView { op: "updateLayout" }.into());
            return;
        }

        let width = self
            .layout
            .scene_width(self.buffer.block_duration(), self.buffer.number_blocks());
        let height = self.layout.scene_height(self.registry.len());
        let pitch = self.layout.row_pitch();

        self.channel_y_pos.clear();
        self.channel_y_pos.insert(EventChannel::Undefined, 0);

        if let Some(view) = self.view.as_mut() {
            view.resize_scene(width, height);
            let mut y_pos = 0;
            for (ch, item) in self.registry.iter_mut() {
                self.channel_y_pos.insert(EventChannel::Channel(ch), y_pos);
                item.set_height(self.layout.signal_height);
                item.set_pos(0, y_pos);
                item.set_z_value(signal_item::SIGNAL_Z);
                item.update_y_grid_interval(self.layout.preferred_y_grid_pixel_interval);
                item.enable_y_grid(self.layout.show_y_grid);
                item.show();
                view.add_signal_item(ch, item);
                #[cfg(feature = "layout_debug")]
                eprintln!("layout: channel {} y_pos = {}", ch, y_pos);
                y_pos = y_pos.saturating_add(pitch);
            }
        }

        let ids: Vec<EventId> = self.event_items.keys().copied().collect();
        for id in ids {
            self.place_event_item(id, height);
        }

        self.layout.x_grid_pixel_interval = self.layout.compute_x_grid_pixel_interval();
        log::debug!(
            "SignalBrowserModel::updateLayout scene {}x{}, x grid {} px",
            width,
            height,
            self.layout.x_grid_pixel_interval
        );
        if let Some(view) = self.view.as_mut() {
            view.update();
        }
    }

    /// Prefetch prediction: shown channels overlapping the visible band keep
    /// decoding, the others are suspended.
    pub fn update_viewport(&mut self, content_y: i32, visible_height: i32) {
        if !self.accept("canvasViewContentMoving") {
            return;
        }
        let pitch = self.layout.row_pitch();
        let height = self.layout.signal_height;
        let mut row_y: i32 = 0;
        for ch in self.registry.channels() {
            let visible = row_y.saturating_add(height) > content_y && row_y < content_y.saturating_add(visible_height);
            self.buffer.set_channel_active(ch, visible);
            row_y = row_y.saturating_add(pitch);
        }
    }

    /// Scroll to `sec` seconds and, if given, to display row `shown_nr`.
    pub fn go_to(&mut self, sec: f64, shown_nr: Option<usize>) {
        if !self.accept("goTo") {
            return;
        }
        let x = (sec * self.layout.pixel_per_sec) as i32;
        let pitch = self.layout.row_pitch();
        if let Some(view) = self.view.as_mut() {
            let y = match shown_nr {
                Some(row) => i32::try_from(row).unwrap_or(i32::MAX).saturating_mul(pitch),
                None => view.contents_pos().1,
            };
            view.set_contents_pos(x, y);
        }
    }

    /// Zoom so that the scene rectangle `(x, y, width, height)` fills the
    /// visible area.
    pub fn zoom_rect(&mut self, x: i32, y: i32, width: i32, height: i32) {
        if !self.accept("zoomRect") {
            return;
        }
        if !self.check_positive("zoomRect", "width", width as f64)
            || !self.check_positive("zoomRect", "height", height as f64)
        {
            return;
        }
        let (visible_width, visible_height) = self.view.as_ref().map(|v| v.visible_size()).unwrap_or((0, 0));
        if visible_width <= 0 || visible_height <= 0 {
            self.report(
                "zoomRect",
                BrowserError::InvalidParameter {
                    name: "visible_size",
                    value: visible_width.min(visible_height) as f64,
                },
            );
            return;
        }

        let pitch = self.layout.row_pitch().max(1) as f64;
        let sec = x as f64 / self.layout.pixel_per_sec;
        let first_row = (y as f64 / pitch) as i32;

        let pps = self.layout.pixel_per_sec * visible_width as f64 / width as f64;
        self.layout.pixel_per_sec = pps.min(visible_width as f64);

        let rows_per_page = (visible_height as f64 / pitch) * height as f64 / visible_height as f64;
        let rows = rows_per_page.ceil().max(1.0);
        let signal_height = ((visible_height as f64 / rows) as i32).min(visible_height);
        self.layout.signal_height = (signal_height - self.layout.signal_spacing).max(1);
        self.update_layout();

        let new_x = (sec * self.layout.pixel_per_sec) as i32;
        let new_y = first_row.saturating_mul(self.layout.row_pitch());
        if let Some(view) = self.view.as_mut() {
            view.set_contents_pos(new_x, new_y);
        }
    }

    /// Min/max pair per pixel column for a shown channel, starting at scene
    /// x `x_px`. Columns left of the recording start are `(NaN, NaN)`.
    pub fn render_columns(&mut self, channel_nr: usize, x_px: f64, width_px: usize) -> Option<Vec<(f32, f32)>> {
        if self.state != BrowserState::Ready {
            let state = self.state;
            self.report(
                "renderColumns",
                PreconditionError::IllegalState {
                    op: "renderColumns",
                    state,
                }
                .into(),
            );
            return None;
        }
        let Some(sample_rate) = self.registry.get(channel_nr).map(|i| i.channel().sample_rate) else {
            let channels = self.buffer.header().number_channels();
            self.report("renderColumns", BrowserError::InvalidChannel { channel: channel_nr, channels });
            return None;
        };
        let samples_per_px = sample_rate / self.layout.pixel_per_sec;
        match self
            .buffer
            .min_max_columns(channel_nr, x_px * samples_per_px, samples_per_px, width_px)
        {
            Ok(cols) => Some(cols),
            Err(e) => {
                self.report("renderColumns", e.into());
                None
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Events
    // ─────────────────────────────────────────────────────────────────────────

    /// Copy every event, in insertion order, onto `out`.
    pub fn get_events(&self, out: &mut Vec<SignalEvent>) {
        for ordinal in 0..self.buffer.number_events() {
            if let Some(event) = self
                .buffer
                .event_number_to_id(ordinal)
                .and_then(|id| self.buffer.event(id))
            {
                out.push(event.clone());
            }
        }
    }

    pub fn event_item(&self, id: EventId) -> Option<&EventItem> {
        self.event_items.get(&id)
    }

    pub fn add_event(&mut self, event: SignalEvent) -> Option<EventId> {
        if !self.accept("addEvent") {
            return None;
        }
        self.insert_event(event)
    }

    fn insert_event(&mut self, event: SignalEvent) -> Option<EventId> {
        match self.buffer.add_event(event) {
            Ok(id) => {
                self.event_items.insert(id, EventItem::new(id));
                self.refresh_event(id);
                Some(id)
            }
            Err(e) => {
                self.report("addEvent", e.into());
                None
            }
        }
    }

    pub fn remove_event(&mut self, id: EventId) {
        if !self.accept("removeEvent") {
            return;
        }
        if self.buffer.remove_event(id).is_none() {
            self.report("removeEvent", BrowserError::InvalidEvent(id));
            return;
        }
        self.event_items.remove(&id);
        if self.selected_event == Some(id) {
            self.selected_event = None;
        }
        if let Some(view) = self.view.as_mut() {
            view.remove_event_item(id);
            view.update();
        }
    }

    /// Recompute the item of an event after the event was edited.
    pub fn set_event_changed(&mut self, id: EventId) {
        if !self.accept("setEventChanged") {
            return;
        }
        if self.buffer.event(id).is_none() {
            self.report("setEventChanged", BrowserError::InvalidEvent(id));
            return;
        }
        self.event_items.entry(id).or_insert_with(|| EventItem::new(id));
        self.refresh_event(id);
        if let Some(view) = self.view.as_mut() {
            view.update();
        }
    }

    fn refresh_event(&mut self, id: EventId) {
        let height = self.layout.scene_height(self.registry.len());
        self.place_event_item(id, height);
    }

    fn place_event_item(&mut self, id: EventId, scene_height: i32) {
        let Some(event) = self.buffer.event(id) else {
            self.report("updateLayout", BrowserError::InvalidEvent(id));
            return;
        };
        let row_y = self.channel_y_pos.get(&event.channel).copied();
        let type_shown = self.is_event_type_shown(event.event_type);
        let rate = self.buffer.event_sample_rate();
        let Some(item) = self.event_items.get_mut(&id) else {
            return;
        };
        let visible = item.place(event, row_y, type_shown, &self.layout, scene_height, rate);
        if !visible && self.selected_event == Some(id) {
            item.set_selected(false);
            self.selected_event = None;
        }
        if let Some(view) = self.view.as_mut() {
            view.update_event_item(item);
        }
    }

    pub fn is_event_type_shown(&self, event_type: u16) -> bool {
        self.all_event_types_selected || self.shown_event_types.contains(&event_type)
    }

    pub fn shown_event_types(&self) -> Vec<u16> {
        self.shown_event_types.iter().copied().collect()
    }

    /// `all = true` shows every type regardless of the list.
    pub fn set_shown_event_types(&mut self, event_types: &[u16], all: bool) {
        self.shown_event_types = event_types.iter().copied().collect();
        self.all_event_types_selected = all;
    }

    pub fn is_show_all_event_types(&self) -> bool {
        self.all_event_types_selected
    }

    /// Type given to events created in [`BrowserMode::NewEvent`].
    pub fn actual_event_creation_type(&self) -> Option<u16> {
        self.actual_event_creation_type
    }

    // ── Selection ────────────────────────────────────────────────────────────

    pub fn selected_event(&self) -> Option<EventId> {
        self.selected_event
    }

    pub fn set_selected_event(&mut self, id: Option<EventId>) {
        if let Some(id) = id {
            if self.buffer.event(id).is_none() {
                self.report("setSelectedEventItem", BrowserError::InvalidEvent(id));
                return;
            }
            if !self.event_items.contains_key(&id) {
                self.event_items.insert(id, EventItem::new(id));
                self.refresh_event(id);
            }
        }
        if let Some(old) = self.selected_event.and_then(|old| self.event_items.get_mut(&old)) {
            old.set_selected(false);
        }
        self.selected_event = id;
        if let Some(item) = id.and_then(|id| self.event_items.get_mut(&id)) {
            item.set_selected(true);
        }
        if let Some(view) = self.view.as_mut() {
            view.update();
        }
    }

    pub fn selection_state(&self) -> SelectionState {
        match self.selected_event.and_then(|id| self.buffer.event(id)) {
            None => SelectionState::None,
            Some(event) if event.channel.is_undefined() => SelectionState::AllChannels,
            Some(_) => SelectionState::OneChannel,
        }
    }

    pub fn set_selected_event_to_all_channels(&mut self) {
        self.change_selected_event_channel(EventChannel::Undefined);
    }

    /// Move the selected event to `channel`, which must be
    /// UNDEFINED_CHANNEL or a shown channel.
    pub fn change_selected_event_channel(&mut self, channel: EventChannel) {
        if !self.accept("changeSelectedEventChannel") {
            return;
        }
        let Some(id) = self.selected_event else {
            return;
        };
        if let EventChannel::Channel(ch) = channel {
            if !self.registry.contains(ch) {
                let channels = self.buffer.header().number_channels();
                self.report("changeSelectedEventChannel", BrowserError::InvalidChannel { channel: ch, channels });
                return;
            }
        }
        let Some(event) = self.buffer.event_mut(id) else {
            self.report("changeSelectedEventChannel", BrowserError::InvalidEvent(id));
            return;
        };
        if event.channel == channel {
            return;
        }
        event.channel = channel;
        self.set_event_changed(id);
    }

    /// Copy the selected event onto each listed shown channel other than its own.
    pub fn copy_selected_event_to_channels(&mut self, channels: &[usize]) -> Vec<EventId> {
        let mut created = Vec::new();
        if !self.accept("copySelectedEventToChannels") {
            return created;
        }
        let Some(event) = self.selected_event.and_then(|id| self.buffer.event(id)).cloned() else {
            return created;
        };
        for &ch in channels {
            if event.channel == EventChannel::Channel(ch) || !self.registry.contains(ch) {
                continue;
            }
            let mut copy = event.clone();
            copy.id = None;
            copy.channel = EventChannel::Channel(ch);
            if let Some(id) = self.insert_event(copy) {
                created.push(id);
            }
        }
        if let Some(view) = self.view.as_mut() {
            view.update();
        }
        created
    }

    /// Retype the selected event, or, with nothing selected, set the type
    /// used for new events.
    pub fn change_selected_event_type(&mut self, event_type: u16) {
        if !self.accept("changeSelectedEventType") {
            return;
        }
        let Some(id) = self.selected_event else {
            self.actual_event_creation_type = Some(event_type);
            return;
        };
        let Some(event) = self.buffer.event_mut(id) else {
            self.report("changeSelectedEventType", BrowserError::InvalidEvent(id));
            return;
        };
        if event.event_type == event_type {
            return;
        }
        event.event_type = event_type;
        self.set_event_changed(id);
    }

    pub fn remove_selected_event(&mut self) {
        let Some(id) = self.selected_event else {
            return;
        };
        self.remove_event(id);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Settings
    // ─────────────────────────────────────────────────────────────────────────

    pub fn settings(&self) -> BrowserSettings {
        let options = self.buffer.options();
        let (lo, hi) = self.buffer.default_range();
        BrowserSettings {
            release_buffer: self.release_buffer,
            whole_buffer: options.whole_buffer,
            init_downsampling: options.downsampling,
            init_min_max_search: options.min_max_search,
            default_range: [lo, hi],
            window_blocks: options.window_blocks,
            pixel_per_sec: self.layout.pixel_per_sec,
            signal_height: self.layout.signal_height,
            signal_spacing: self.layout.signal_spacing,
            preferred_x_grid_pixel_interval: self.layout.preferred_x_grid_pixel_interval,
            preferred_y_grid_pixel_interval: self.layout.preferred_y_grid_pixel_interval,
            show_x_grid: self.layout.show_x_grid,
            show_y_grid: self.layout.show_y_grid,
            show_channel_labels: self.layout.show_channel_labels,
            show_x_scales: self.layout.show_x_scales,
            show_y_scales: self.layout.show_y_scales,
            auto_zoom: self.auto_zoom,
            all_event_types_selected: self.all_event_types_selected,
            shown_event_types: self.shown_event_types(),
        }
    }

    /// Take over `settings`. Layout is not recomputed.
    pub fn apply_settings(&mut self, settings: &BrowserSettings) {
        let mut s = settings.clone().sanitized();
        if !LayoutState::rows_fit(s.signal_height, s.signal_spacing, self.buffer.header().number_channels()) {
            let d = BrowserSettings::default();
            s.signal_height = d.signal_height;
            s.signal_spacing = d.signal_spacing;
        }
        self.release_buffer = s.release_buffer;
        self.buffer.set_whole_data_buffer(s.whole_buffer);
        self.buffer.enable_init_downsampling(s.init_downsampling);
        self.buffer.enable_init_min_max_search(s.init_min_max_search);
        self.buffer.set_default_range(s.default_range[0], s.default_range[1]);
        self.buffer.set_window_blocks(s.window_blocks);
        self.layout.pixel_per_sec = s.pixel_per_sec;
        self.layout.signal_height = s.signal_height;
        self.layout.signal_spacing = s.signal_spacing;
        self.layout.preferred_x_grid_pixel_interval = s.preferred_x_grid_pixel_interval;
        self.layout.preferred_y_grid_pixel_interval = s.preferred_y_grid_pixel_interval;
        self.layout.show_x_grid = s.show_x_grid;
        self.layout.show_y_grid = s.show_y_grid;
        self.layout.show_channel_labels = s.show_channel_labels;
        self.layout.show_x_scales = s.show_x_scales;
        self.layout.show_y_scales = s.show_y_scales;
        self.auto_zoom = s.auto_zoom;
        self.set_shown_event_types(&s.shown_event_types, s.all_event_types_selected);
    }
}
