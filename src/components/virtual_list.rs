use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use futures_timer::Delay;

use crate::i18n::I18nManager;

pub const DEFAULT_OVERSCAN: usize = 3;
pub const DEFAULT_END_REACHED_THRESHOLD: f32 = 200.0;
pub const DEFAULT_IDLE_DELAY: Duration = Duration::from_millis(150);

#[derive(Clone)]
pub enum ItemHeight {
    Fixed(f32),
    /// Height computed from the item index.
    Dynamic(Arc<dyn Fn(usize) -> f32 + Send + Sync>),
}

impl ItemHeight {
    pub fn dynamic(height: impl Fn(usize) -> f32 + Send + Sync + 'static) -> Self {
        Self::Dynamic(Arc::new(height))
    }

    fn height_of(&self, index: usize) -> f32 {
        let height = match self {
            ItemHeight::Fixed(height) => *height,
            ItemHeight::Dynamic(height) => height(index),
        };
        sanitize_extent(height)
    }
}

/// Non-finite and negative extents collapse to zero.
fn sanitize_extent(value: f32) -> f32 {
    if value.is_finite() { value.max(0.0) } else { 0.0 }
}

impl Debug for ItemHeight {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemHeight::Fixed(height) => f.debug_tuple("Fixed").field(height).finish(),
            ItemHeight::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct VirtualListOptions {
    /// Viewport height.
    pub height: f32,
    pub item_height: ItemHeight,
    pub overscan: usize,
    /// Remaining scroll distance below which `on_end_reached` fires.
    pub end_reached_threshold: f32,
    pub idle_delay: Duration,
}

impl Default for VirtualListOptions {
    fn default() -> Self {
        Self {
            height: 0.0,
            item_height: ItemHeight::Fixed(48.0),
            overscan: DEFAULT_OVERSCAN,
            end_reached_threshold: DEFAULT_END_REACHED_THRESHOLD,
            idle_delay: DEFAULT_IDLE_DELAY,
        }
    }
}

impl VirtualListOptions {
    pub fn new(height: f32, item_height: ItemHeight) -> Self {
        Self {
            height: sanitize_extent(height),
            item_height,
            ..Self::default()
        }
    }

    pub fn overscan(mut self, value: usize) -> Self {
        self.overscan = value;
        self
    }

    pub fn end_reached_threshold(mut self, value: f32) -> Self {
        self.end_reached_threshold = value;
        self
    }

    pub fn idle_delay(mut self, value: Duration) -> Self {
        self.idle_delay = value;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ItemPosition {
    pub index: usize,
    pub top: f32,
    pub height: f32,
    pub bottom: f32,
}

/// Inclusive index range of rows to materialize.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct VisibleRange {
    pub start: usize,
    pub end: usize,
}

impl VisibleRange {
    pub fn count(&self) -> usize {
        self.end - self.start + 1
    }

    pub fn contains(&self, index: usize) -> bool {
        (self.start..=self.end).contains(&index)
    }
}

#[derive(Debug)]
pub struct VisibleItem<'a, T> {
    pub index: usize,
    pub top: f32,
    pub height: f32,
    pub item: &'a T,
}

/// What the list body shows besides rows.
#[derive(Clone, Debug, PartialEq)]
pub enum ListContent {
    /// No rows yet and a load is running.
    Loading(String),
    Empty(String),
    /// Rows are shown; `loading_more` asks for a trailing spinner.
    Items { loading_more: bool },
}

/// Windowing state of a scrollable list with precomputed row positions.
pub struct VirtualList<T> {
    items: Vec<T>,
    options: VirtualListOptions,
    positions: Vec<ItemPosition>,
    measured: BTreeMap<usize, f32>,
    scroll_top: f32,
    loading: bool,
    has_more: bool,
    scrolling: Arc<AtomicBool>,
    scroll_ticket: Arc<AtomicU64>,
    on_end_reached: Option<Box<dyn FnMut() + Send>>,
    on_scroll: Option<Box<dyn FnMut(f32) + Send>>,
}

impl<T> VirtualList<T> {
    pub fn new(items: Vec<T>, mut options: VirtualListOptions) -> Self {
        options.height = sanitize_extent(options.height);
        let mut list = Self {
            items,
            options,
            positions: Vec::new(),
            measured: BTreeMap::new(),
            scroll_top: 0.0,
            loading: false,
            has_more: true,
            scrolling: Arc::new(AtomicBool::new(false)),
            scroll_ticket: Arc::new(AtomicU64::new(0)),
            on_end_reached: None,
            on_scroll: None,
        };
        list.recalculate_layout();
        list
    }

    pub fn on_end_reached(mut self, callback: impl FnMut() + Send + 'static) -> Self {
        self.on_end_reached = Some(Box::new(callback));
        self
    }

    pub fn on_scroll_callback(mut self, callback: impl FnMut(f32) + Send + 'static) -> Self {
        self.on_scroll = Some(Box::new(callback));
        self
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn options(&self) -> &VirtualListOptions {
        &self.options
    }

    /// Replaces the data; measured heights are dropped.
    pub fn set_items(&mut self, items: Vec<T>) {
        self.items = items;
        self.measured.clear();
        self.recalculate_layout();
    }

    /// Appends a loaded page and clears the loading flag.
    pub fn append_items(&mut self, items: impl IntoIterator<Item = T>) {
        self.items.extend(items);
        self.loading = false;
        self.recalculate_layout();
    }

    pub fn set_item_height(&mut self, item_height: ItemHeight) {
        self.options.item_height = item_height;
        self.recalculate_layout();
    }

    pub fn set_height(&mut self, height: f32) {
        self.options.height = sanitize_extent(height);
    }

    /// Records a measured row height. Returns whether the layout changed.
    pub fn update_item_height(&mut self, index: usize, height: f32) -> bool {
        if index >= self.items.len() || !height.is_finite() {
            return false;
        }
        let height = height.max(0.0);
        let current = self.positions.get(index).map(|position| position.height);
        if current.is_some_and(|current| (current - height).abs() < 0.5) {
            return false;
        }
        self.measured.insert(index, height);
        self.recalculate_layout();
        true
    }

    pub fn recalculate_layout(&mut self) {
        let mut top = 0.0;
        self.positions = (0..self.items.len())
            .map(|index| {
                let height = self
                    .measured
                    .get(&index)
                    .copied()
                    .unwrap_or_else(|| self.options.item_height.height_of(index));
                let position = ItemPosition {
                    index,
                    top,
                    height,
                    bottom: top + height,
                };
                top = position.bottom;
                position
            })
            .collect();
    }

    pub fn positions(&self) -> &[ItemPosition] {
        &self.positions
    }

    pub fn item_position(&self, index: usize) -> Option<ItemPosition> {
        self.positions.get(index).copied()
    }

    pub fn total_height(&self) -> f32 {
        self.positions.last().map_or(0.0, |position| position.bottom)
    }

    pub fn scroll_top(&self) -> f32 {
        self.scroll_top
    }

    /// Rows intersecting the viewport widened by the overscan; `None` without data.
    pub fn visible_range(&self) -> Option<VisibleRange> {
        let last = self.positions.len().checked_sub(1)?;
        let viewport_bottom = self.scroll_top + self.options.height;
        let first_visible = self
            .positions
            .partition_point(|position| position.bottom <= self.scroll_top)
            .min(last);
        let first_below = self
            .positions
            .partition_point(|position| position.top <= viewport_bottom)
            .min(last);
        Some(VisibleRange {
            start: first_visible.saturating_sub(self.options.overscan),
            end: first_below.saturating_add(self.options.overscan).min(last),
        })
    }

    pub fn visible_items(&self) -> Vec<VisibleItem<'_, T>> {
        let Some(range) = self.visible_range() else {
            return Vec::new();
        };
        self.positions[range.start..=range.end]
            .iter()
            .zip(&self.items[range.start..=range.end])
            .map(|(position, item)| VisibleItem {
                index: position.index,
                top: position.top,
                height: position.height,
                item,
            })
            .collect()
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn set_has_more(&mut self, has_more: bool) {
        self.has_more = has_more;
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn is_scrolling(&self) -> bool {
        self.scrolling.load(Ordering::SeqCst)
    }

    /// Applies a scroll offset reported by the host. Returns true when
    /// `on_end_reached` fired.
    pub fn on_scroll(&mut self, scroll_top: f32) -> bool {
        self.scroll_top = if scroll_top.is_finite() { scroll_top.max(0.0) } else { 0.0 };
        self.scrolling.store(true, Ordering::SeqCst);
        self.scroll_ticket.fetch_add(1, Ordering::SeqCst);

        if let Some(on_scroll) = self.on_scroll.as_mut() {
            on_scroll(self.scroll_top);
        }

        let remaining = self.total_height() - (self.scroll_top + self.options.height);
        let near_end = remaining < self.options.end_reached_threshold;
        if near_end && !self.loading && self.has_more {
            if let Some(on_end_reached) = self.on_end_reached.as_mut() {
                tracing::trace!(scroll_top = self.scroll_top, remaining, "list end reached");
                on_end_reached();
                return true;
            }
        }
        false
    }

    /// Resolves after the idle delay and clears the scrolling flag, unless another
    /// scroll happened in the meantime.
    pub fn idle_timer(&self) -> impl Future<Output = ()> + Send + use<T> {
        let ticket = self.scroll_ticket.load(Ordering::SeqCst);
        let latest = self.scroll_ticket.clone();
        let scrolling = self.scrolling.clone();
        let delay = self.options.idle_delay;
        async move {
            Delay::new(delay).await;
            if latest.load(Ordering::SeqCst) == ticket {
                scrolling.store(false, Ordering::SeqCst);
            }
        }
    }

    /// Moves the viewport to `offset`, clamped to the scrollable range.
    pub fn scroll_to_position(&mut self, offset: f32) -> f32 {
        let max = (self.total_height() - self.options.height).max(0.0);
        let offset = if offset.is_finite() { offset.clamp(0.0, max) } else { 0.0 };
        self.on_scroll(offset);
        self.scroll_top
    }

    /// Scrolls so that row `index` starts at the top of the viewport.
    pub fn scroll_to_index(&mut self, index: usize) -> Option<f32> {
        let top = self.positions.get(index)?.top;
        Some(self.scroll_to_position(top))
    }

    pub fn scroll_to_top(&mut self) -> f32 {
        self.scroll_to_position(0.0)
    }

    pub fn scroll_to_bottom(&mut self) -> f32 {
        self.scroll_to_position(self.total_height())
    }

    pub fn content(&self, i18n: &I18nManager) -> ListContent {
        match (self.items.is_empty(), self.loading) {
            (true, true) => ListContent::Loading(i18n.t("list.loading")),
            (true, false) => ListContent::Empty(i18n.t("list.empty")),
            (false, loading_more) => ListContent::Items { loading_more },
        }
    }
}

impl<T: Debug> Debug for VirtualList<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VirtualList")
            .field("len", &self.items.len())
            .field("options", &self.options)
            .field("scroll_top", &self.scroll_top)
            .field("loading", &self.loading)
            .field("has_more", &self.has_more)
            .finish_non_exhaustive()
    }
}
