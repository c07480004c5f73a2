mod error_boundary;
mod lazy;
mod virtual_list;

#[cfg(test)]
mod test_state_logic;

pub use error_boundary::{BoundaryFallback, CaughtError, ErrorBoundary, RenderError, Rendered};
pub use lazy::{
    ComponentCache, DEFAULT_RETRY_COUNT, DEFAULT_RETRY_DELAY, ImportError, ImportFuture,
    LazyError, LazyFallback, LazyLoader, LazyOptions, LazySlot, LoadReport, LoadStrategy,
    SlotState, lazy_batch,
};
pub use virtual_list::{
    DEFAULT_END_REACHED_THRESHOLD, DEFAULT_IDLE_DELAY, DEFAULT_OVERSCAN, ItemHeight,
    ItemPosition, ListContent, VirtualList, VirtualListOptions, VisibleItem, VisibleRange,
};
