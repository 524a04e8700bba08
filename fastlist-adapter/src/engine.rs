use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use fastlist::{
    ConfigError, FastListItem, KeyCounter, LayoutComputer, LayoutOptions, Location,
    ScrollOrientation,
};

use crate::anchor::ScrollAnchor;
use crate::scheduler::{ManualScheduler, Scheduler, TimerSlot, TimerToken};
use crate::speed::{
    DEFAULT_MIN_VELOCITY, DEFAULT_SETTLE_DELAY_MS, ScrollSpeedTracker, Subscription,
};

/// Smallest accepted render window, in batches. Half of it must cover a full viewport.
pub const MIN_BATCHES_TO_RENDER: usize = 10;
pub const DEFAULT_BATCHES_TO_RENDER: usize = 12;
/// How long content-position anchoring stays off after an animated programmatic scroll.
pub const DEFAULT_ANCHOR_PAUSE_MS: u64 = 300;

/// Maps `(section, item)` to a stable identity that survives data changes.
pub type IdFromIndex<I> = Arc<dyn Fn(usize, usize) -> I + Send + Sync>;
pub type OnEndReached = Arc<dyn Fn() + Send + Sync>;

/// Configuration for a [`ListEngine`].
pub struct EngineOptions<I = u64> {
    pub layout: LayoutOptions,
    /// Render window length in batches of `ceil(viewport / 4)`.
    pub batches_to_render: usize,
    pub id_from_index: Option<IdFromIndex<I>>,
    /// Keep the first visible item in place when the content above it changes.
    pub maintain_visible_content_position: bool,
    pub on_end_reached: Option<OnEndReached>,
    /// Distance from the bottom at which the end counts as reached.
    pub end_reached_threshold: u64,
    pub min_velocity: f64,
    pub settle_delay_ms: u64,
    pub anchor_pause_ms: u64,
}

impl EngineOptions<u64> {
    /// Options without an identity mapping; anchoring is off.
    pub fn new(layout: LayoutOptions) -> Self {
        Self::with_defaults(layout, None)
    }
}

impl<I> EngineOptions<I> {
    /// Options with an identity mapping; content-position anchoring is on.
    pub fn new_with_id(
        layout: LayoutOptions,
        id_from_index: impl Fn(usize, usize) -> I + Send + Sync + 'static,
    ) -> Self {
        let mut options = Self::with_defaults(layout, Some(Arc::new(id_from_index)));
        options.maintain_visible_content_position = true;
        options
    }

    fn with_defaults(layout: LayoutOptions, id_from_index: Option<IdFromIndex<I>>) -> Self {
        Self {
            layout,
            batches_to_render: DEFAULT_BATCHES_TO_RENDER,
            id_from_index,
            maintain_visible_content_position: false,
            on_end_reached: None,
            end_reached_threshold: 0,
            min_velocity: DEFAULT_MIN_VELOCITY,
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            anchor_pause_ms: DEFAULT_ANCHOR_PAUSE_MS,
        }
    }

    pub fn with_layout(mut self, layout: LayoutOptions) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_batches_to_render(mut self, batches: usize) -> Self {
        self.batches_to_render = batches;
        self
    }

    pub fn with_id_from_index(
        mut self,
        f: impl Fn(usize, usize) -> I + Send + Sync + 'static,
    ) -> Self {
        self.id_from_index = Some(Arc::new(f));
        self
    }

    pub fn with_maintain_visible_content_position(mut self, enabled: bool) -> Self {
        self.maintain_visible_content_position = enabled;
        self
    }

    pub fn with_on_end_reached(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_end_reached = Some(Arc::new(f));
        self
    }

    pub fn with_end_reached_threshold(mut self, threshold: u64) -> Self {
        self.end_reached_threshold = threshold;
        self
    }

    pub fn with_min_velocity(mut self, px_per_ms: f64) -> Self {
        self.min_velocity = px_per_ms;
        self
    }

    pub fn with_settle_delay_ms(mut self, delay_ms: u64) -> Self {
        self.settle_delay_ms = delay_ms;
        self
    }

    pub fn with_anchor_pause_ms(mut self, pause_ms: u64) -> Self {
        self.anchor_pause_ms = pause_ms;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batches_to_render < MIN_BATCHES_TO_RENDER {
            return Err(ConfigError::TooFewBatches {
                requested: self.batches_to_render,
                minimum: MIN_BATCHES_TO_RENDER,
            });
        }
        if self.maintain_visible_content_position && self.id_from_index.is_none() {
            return Err(ConfigError::AnchorWithoutIdentity);
        }
        Ok(())
    }
}

impl<I> Clone for EngineOptions<I> {
    fn clone(&self) -> Self {
        Self {
            layout: self.layout.clone(),
            batches_to_render: self.batches_to_render,
            id_from_index: self.id_from_index.clone(),
            maintain_visible_content_position: self.maintain_visible_content_position,
            on_end_reached: self.on_end_reached.clone(),
            end_reached_threshold: self.end_reached_threshold,
            min_velocity: self.min_velocity,
            settle_delay_ms: self.settle_delay_ms,
            anchor_pause_ms: self.anchor_pause_ms,
        }
    }
}

impl<I> fmt::Debug for EngineOptions<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineOptions")
            .field("layout", &self.layout)
            .field("batches_to_render", &self.batches_to_render)
            .field("id_from_index", &self.id_from_index.is_some())
            .field(
                "maintain_visible_content_position",
                &self.maintain_visible_content_position,
            )
            .field("on_end_reached", &self.on_end_reached.is_some())
            .field("end_reached_threshold", &self.end_reached_threshold)
            .field("min_velocity", &self.min_velocity)
            .field("settle_delay_ms", &self.settle_delay_ms)
            .field("anchor_pause_ms", &self.anchor_pause_ms)
            .finish()
    }
}

/// A scroll the host should perform.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScrollCommand {
    pub offset: u64,
    pub animated: bool,
}

/// Arguments of [`ListEngine::scroll_to_location`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScrollRequest {
    pub section: usize,
    /// `None` targets the section header.
    pub item: Option<usize>,
    pub orientation: ScrollOrientation,
    pub padding_start: u64,
    pub padding_end: u64,
    pub animated: bool,
    /// Pin the target as a custom anchor. Needs an item and an `id_from_index` mapping.
    pub set_anchor: bool,
}

impl ScrollRequest {
    pub fn section(section: usize) -> Self {
        Self {
            section,
            item: None,
            orientation: ScrollOrientation::Top,
            padding_start: 0,
            padding_end: 0,
            animated: false,
            set_anchor: false,
        }
    }

    pub fn item(section: usize, item: usize) -> Self {
        Self {
            item: Some(item),
            ..Self::section(section)
        }
    }

    pub fn with_orientation(mut self, orientation: ScrollOrientation) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn with_padding(mut self, padding_start: u64, padding_end: u64) -> Self {
        self.padding_start = padding_start;
        self.padding_end = padding_end;
        self
    }

    pub fn with_animated(mut self, animated: bool) -> Self {
        self.animated = animated;
        self
    }

    pub fn with_set_anchor(mut self, set_anchor: bool) -> Self {
        self.set_anchor = set_anchor;
        self
    }
}

/// Serializable viewport snapshot, see [`ListEngine::state`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ListState {
    pub viewport_extent: u32,
    pub scroll_offset: u64,
}

/// Orchestrates a [`LayoutComputer`] from host events.
///
/// The engine holds no UI objects. The host:
/// - reports `on_layout` / `on_scroll` and the drag/momentum events
/// - forwards fired timers to `on_timer`
/// - renders [`ListEngine::items`] inside a scroll container of [`ListEngine::total_size`]
/// - performs any returned [`ScrollCommand`]
///
/// Records are computed for a window of `batches_to_render` batches centered on the scroll
/// position and only recomputed once the scroll position leaves the current batch bounds.
#[derive(Debug)]
pub struct ListEngine<I = u64, S = ManualScheduler> {
    options: EngineOptions<I>,
    layout: LayoutComputer,
    speed: ScrollSpeedTracker,
    anchor: ScrollAnchor<I>,
    scheduler: S,

    scroll_offset: u64,
    /// Batch bounds of the last computed window.
    window: Option<(u64, u64)>,
    items: Vec<FastListItem>,
    total_size: u64,
    laid_out: bool,
    at_end: bool,

    recompute: TimerSlot,
    anchor_pause: TimerSlot,
    torn_down: bool,
}

impl<I: Clone + PartialEq, S: Scheduler> ListEngine<I, S> {
    pub fn new(options: EngineOptions<I>, scheduler: S) -> Result<Self, ConfigError> {
        Self::with_key_counter(options, scheduler, KeyCounter::new())
    }

    /// Creates an engine whose records draw keys from a shared counter.
    pub fn with_key_counter(
        options: EngineOptions<I>,
        scheduler: S,
        counter: KeyCounter,
    ) -> Result<Self, ConfigError> {
        options.validate()?;
        Ok(Self {
            layout: LayoutComputer::with_key_counter(options.layout.clone(), counter),
            speed: ScrollSpeedTracker::new(options.min_velocity, options.settle_delay_ms),
            anchor: ScrollAnchor::new(),
            scheduler,
            scroll_offset: 0,
            window: None,
            items: Vec::new(),
            total_size: 0,
            laid_out: false,
            at_end: false,
            recompute: TimerSlot::default(),
            anchor_pause: TimerSlot::default(),
            torn_down: false,
            options,
        })
    }

    pub fn options(&self) -> &EngineOptions<I> {
        &self.options
    }

    pub fn layout(&self) -> &LayoutComputer {
        &self.layout
    }

    pub fn anchor(&self) -> &ScrollAnchor<I> {
        &self.anchor
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    /// Records to render, in layout order.
    pub fn items(&self) -> &[FastListItem] {
        &self.items
    }

    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    pub fn scroll_offset(&self) -> u64 {
        self.scroll_offset
    }

    pub fn viewport_extent(&self) -> u32 {
        self.layout.viewport_extent()
    }

    pub fn is_laid_out(&self) -> bool {
        self.laid_out
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// `ceil(viewport / 4)`, at least 1.
    pub fn batch_size(&self) -> u64 {
        u64::from(self.viewport_extent()).div_ceil(4).max(1)
    }

    /// Pixel bounds `[start, end)` of the last computed window.
    pub fn render_window(&self) -> Option<(u64, u64)> {
        let batch = self.batch_size();
        self.window.map(|(first, end)| (first * batch, end * batch))
    }

    pub fn has_pending_recompute(&self) -> bool {
        self.recompute.is_armed()
    }

    pub fn is_scrolling(&self) -> bool {
        self.speed.is_scrolling()
    }

    pub fn subscribe_scrolling(
        &mut self,
        callback: impl FnMut(bool) + Send + 'static,
    ) -> Subscription {
        self.speed.subscribe(callback)
    }

    pub fn unsubscribe_scrolling(&mut self, subscription: Subscription) -> bool {
        self.speed.unsubscribe(subscription)
    }

    pub fn state(&self) -> ListState {
        ListState {
            viewport_extent: self.viewport_extent(),
            scroll_offset: self.scroll_offset,
        }
    }

    /// Re-applies a snapshot taken with [`ListEngine::state`] and recomputes exactly.
    pub fn restore_state(&mut self, state: ListState) {
        if self.torn_down {
            return;
        }
        self.scroll_offset = state.scroll_offset;
        self.laid_out = false;
        self.window = None;
        self.on_layout(state.viewport_extent);
    }

    pub fn on_layout(&mut self, extent: u32) {
        if self.torn_down {
            return;
        }
        // A collapsed viewport keeps the last geometry.
        if extent == 0 {
            return;
        }
        let changed = self.layout.set_viewport_extent(extent);
        if self.laid_out && !changed {
            return;
        }
        vdebug!(extent, first = !self.laid_out, "ListEngine::on_layout");
        self.laid_out = true;
        self.scroll_offset = self.clamped(self.scroll_offset);
        self.recompute_now(true);
    }

    pub fn on_scroll(&mut self, position: u64, now_ms: u64) {
        if self.torn_down {
            return;
        }
        let position = if self.laid_out {
            self.clamped(position)
        } else {
            vwarn!(position, "scroll reported before the first layout");
            position
        };
        self.scroll_offset = position;
        self.speed.report_position(position, now_ms, &mut self.scheduler);
        if !self.laid_out {
            return;
        }

        if self.window != Some(self.render_bounds()) {
            vtrace!(position, "render window moved; deferring recompute");
            self.recompute.arm(&mut self.scheduler, 0);
        }
        self.check_end_reached();
    }

    /// The user took over scrolling: any custom anchor no longer applies.
    pub fn on_scroll_begin_drag(&mut self) {
        if self.torn_down {
            return;
        }
        self.anchor.clear_custom();
    }

    /// Flushes a pending deferred recompute so the resting position renders right away.
    pub fn on_momentum_scroll_end(&mut self) {
        if self.torn_down || !self.recompute.is_armed() {
            return;
        }
        self.recompute_now(false);
    }

    /// Handles a fired timer. Unknown and stale tokens are ignored.
    pub fn on_timer(&mut self, token: TimerToken) {
        if self.torn_down {
            return;
        }
        if self.recompute.fire(token) {
            self.recompute_now(false);
        } else if self.anchor_pause.fire(token) {
            vtrace!("anchor pause elapsed");
        } else if !self.speed.on_timer(token) {
            vtrace!(token = token.0, "ignoring stale timer");
        }
    }

    /// Applies new options and relayouts.
    ///
    /// With content-position anchoring on, the first visible item (or the pinned custom anchor)
    /// is captured before the change and located again after it; the returned command keeps it
    /// at the same viewport offset.
    pub fn set_options(
        &mut self,
        options: EngineOptions<I>,
    ) -> Result<Option<ScrollCommand>, ConfigError> {
        options.validate()?;
        if self.torn_down {
            return Ok(None);
        }

        let anchoring = self.laid_out && self.anchoring_enabled();
        if anchoring {
            if let Some(id) = &self.options.id_from_index {
                self.anchor.refresh(|s, i| id(s, i), &self.items, self.scroll_offset);
            }
        }

        self.speed.set_thresholds(options.min_velocity, options.settle_delay_ms);
        let changed = self.layout.configure(options.layout.clone());
        self.options = options;
        if !self.laid_out {
            return Ok(None);
        }
        if !changed {
            if self.window != Some(self.render_bounds()) {
                self.recompute_now(true);
            }
            return Ok(None);
        }

        let mut command = None;
        let corrected = if anchoring && self.options.maintain_visible_content_position {
            self.resolve_anchor()
        } else {
            None
        };
        if let Some(offset) = corrected {
            let offset = self.layout.clamp_scroll_offset(offset);
            if offset != self.scroll_offset {
                vdebug!(from = self.scroll_offset, to = offset, "anchor correction");
                self.scroll_offset = offset;
                command = Some(ScrollCommand {
                    offset,
                    animated: false,
                });
            }
        }
        self.scroll_offset = self.clamped(self.scroll_offset);
        self.recompute_now(true);
        Ok(command)
    }

    /// Computes where `request` should scroll to and applies it.
    ///
    /// Returns `None` when the target does not exist or no scroll is needed.
    pub fn scroll_to_location(&mut self, request: ScrollRequest) -> Option<ScrollCommand> {
        if self.torn_down || !self.laid_out {
            return None;
        }
        let (loc, target) = self.target_for(&request)?;
        // Animated scrolls pause anchoring instead of pinning.
        let pin = request.set_anchor && !request.animated;
        if let (true, Some(item), Some(id)) = (pin, request.item, &self.options.id_from_index) {
            let id = id(request.section, item);
            self.anchor.pin_custom(id, request.section, item, loc.offset, target);
        }
        self.apply_scroll(target, request.animated)
    }

    /// The clamped offset [`ListEngine::scroll_to_location`] would scroll to.
    ///
    /// Returns the current offset when no scroll is needed.
    pub fn scroll_to_location_offset(&mut self, request: &ScrollRequest) -> Option<u64> {
        self.target_for(request).map(|(_, target)| target)
    }

    pub fn scroll_to(&mut self, offset: u64, animated: bool) -> Option<ScrollCommand> {
        if self.torn_down || !self.laid_out {
            return None;
        }
        let target = self.layout.clamp_scroll_offset(offset);
        self.apply_scroll(target, animated)
    }

    pub fn scroll_to_end(&mut self, animated: bool) -> Option<ScrollCommand> {
        self.scroll_to(u64::MAX, animated)
    }

    /// Cancels every pending timer and drops the scrolling subscribers.
    ///
    /// Every later event is ignored.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.recompute.cancel(&mut self.scheduler);
        self.anchor_pause.cancel(&mut self.scheduler);
        self.speed.teardown(&mut self.scheduler);
        self.anchor.clear();
        self.torn_down = true;
        vdebug!("ListEngine::teardown");
    }

    fn anchoring_enabled(&self) -> bool {
        self.options.maintain_visible_content_position && !self.anchor_pause.is_armed()
    }

    fn resolve_anchor(&mut self) -> Option<u64> {
        let id = self.options.id_from_index.as_ref()?;
        let target = self
            .anchor
            .consume(&self.layout.options().sections, |s, i| id(s, i))?;
        let loc = self.layout.locate(target.section, Some(target.item))?;
        let shift = target.offset_in_viewport.unsigned_abs();
        Some(if target.offset_in_viewport >= 0 {
            loc.offset.saturating_sub(shift)
        } else {
            loc.offset.saturating_add(shift)
        })
    }

    fn target_for(&mut self, request: &ScrollRequest) -> Option<(Location, u64)> {
        let loc = self.layout.locate(request.section, request.item)?;
        let viewport = u64::from(self.viewport_extent());
        let scroll = self.scroll_offset;
        let top = loc
            .offset
            .saturating_sub(loc.section_offset)
            .saturating_sub(request.padding_start);

        let target = match request.orientation {
            ScrollOrientation::Top => top,
            ScrollOrientation::Center => loc.midpoint().saturating_sub(viewport / 2),
            ScrollOrientation::Visible => {
                let view_start = scroll.saturating_add(request.padding_start);
                let view_end = scroll
                    .saturating_add(viewport)
                    .saturating_sub(request.padding_end);
                if loc.offset >= view_start && loc.end() <= view_end {
                    scroll
                } else if loc.size > viewport || loc.offset < view_start {
                    top
                } else {
                    loc.end()
                        .saturating_add(request.padding_end)
                        .saturating_sub(viewport)
                }
            }
        };
        // The destination never runs past the chunks that hold the entry plus a viewport.
        let limit = self
            .layout
            .chunk_range_for(request.section, request.item, viewport)
            .and_then(|range| self.layout.chunk_bounds(range))
            .map_or(target, |(_, end)| end.saturating_sub(viewport));
        Some((loc, self.layout.clamp_scroll_offset(target.min(limit))))
    }

    fn apply_scroll(&mut self, target: u64, animated: bool) -> Option<ScrollCommand> {
        if target == self.scroll_offset {
            vtrace!(target, "already at target");
            return None;
        }
        if animated {
            // The host animates and reports positions through `on_scroll`.
            self.anchor_pause.arm(&mut self.scheduler, self.options.anchor_pause_ms);
        } else {
            self.scroll_offset = target;
            self.recompute_now(true);
        }
        Some(ScrollCommand {
            offset: target,
            animated,
        })
    }

    fn clamped(&mut self, offset: u64) -> u64 {
        let clamped = self.layout.clamp_scroll_offset(offset);
        if clamped != offset {
            vdebug!(offset, clamped, "scroll offset beyond content; clamped");
        }
        clamped
    }

    /// `(first, end)` batch indexes of the window around the current scroll position.
    fn render_bounds(&self) -> (u64, u64) {
        let batches = self.options.batches_to_render as u64;
        let current = self.scroll_offset / self.batch_size();
        let first = current.saturating_sub(batches / 2);
        (first, first + batches)
    }

    fn recompute_now(&mut self, exact: bool) {
        self.recompute.cancel(&mut self.scheduler);
        if !self.laid_out {
            return;
        }
        let bounds = self.render_bounds();
        let batch = self.batch_size();
        let window = self
            .layout
            .visible(bounds.0 * batch, bounds.1 * batch, &self.items, exact);
        self.total_size = window.size;
        self.items = window.items.clone();
        self.window = Some(bounds);
        vtrace!(
            first_batch = bounds.0,
            end_batch = bounds.1,
            exact,
            records = self.items.len(),
            "recomputed window"
        );
        self.check_end_reached();
    }

    fn check_end_reached(&mut self) {
        let bottom = self
            .scroll_offset
            .saturating_add(u64::from(self.viewport_extent()))
            .saturating_add(self.options.end_reached_threshold);
        let at_end = bottom >= self.total_size;
        if at_end == self.at_end {
            return;
        }
        self.at_end = at_end;
        if at_end {
            vdebug!(scroll_offset = self.scroll_offset, "end reached");
            if let Some(on_end_reached) = &self.options.on_end_reached {
                on_end_reached();
            }
        }
    }
}

impl<I: Clone + PartialEq> ListEngine<I, ManualScheduler> {
    /// Advances the manual clock and dispatches every timer that became due.
    pub fn run_due_timers(&mut self, now_ms: u64) {
        for token in self.scheduler.advance_to(now_ms) {
            self.on_timer(token);
        }
    }
}
