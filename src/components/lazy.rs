use std::collections::{BTreeMap, HashMap};
use std::fmt::{Debug, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use futures_timer::Delay;
use thiserror::Error;

use crate::i18n::I18nManager;

pub const DEFAULT_RETRY_COUNT: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1000);

pub type ImportError = Box<dyn std::error::Error + Send + Sync>;
pub type ImportFuture<T> = Pin<Box<dyn Future<Output = Result<T, ImportError>> + Send>>;

type ImportFn<T> = Arc<dyn Fn() -> ImportFuture<T> + Send + Sync>;

/// When a lazy component starts loading.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum LoadStrategy {
    /// On first render.
    #[default]
    Lazy,
    /// Right away, at definition time.
    Eager,
    /// In the background, ahead of first render.
    Prefetch,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LazyOptions {
    /// Total number of attempts, including the first one.
    pub retry_count: u32,
    pub retry_delay: Duration,
    pub cache: bool,
    pub strategy: LoadStrategy,
}

impl Default for LazyOptions {
    fn default() -> Self {
        Self {
            retry_count: DEFAULT_RETRY_COUNT,
            retry_delay: DEFAULT_RETRY_DELAY,
            cache: true,
            strategy: LoadStrategy::Lazy,
        }
    }
}

impl LazyOptions {
    pub fn retry_count(mut self, value: u32) -> Self {
        self.retry_count = value;
        self
    }

    pub fn retry_delay(mut self, value: Duration) -> Self {
        self.retry_delay = value;
        self
    }

    pub fn cache(mut self, value: bool) -> Self {
        self.cache = value;
        self
    }

    pub fn strategy(mut self, value: LoadStrategy) -> Self {
        self.strategy = value;
        self
    }

    fn attempts(&self) -> u32 {
        self.retry_count.max(1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LazyError {
    #[error("`{key}` failed to load after {attempts} attempt(s): {last}")]
    Exhausted {
        key: String,
        attempts: u32,
        last: String,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct LoadReport<T> {
    pub value: T,
    pub attempts: u32,
    /// Delays slept between attempts.
    pub retry_delays: Vec<Duration>,
    pub cached: bool,
}

/// Loaded components shared between loaders, keyed by loader key.
pub struct ComponentCache<T> {
    entries: Arc<RwLock<HashMap<String, T>>>,
}

impl<T> Clone for ComponentCache<T> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<T> Default for ComponentCache<T> {
    fn default() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl<T: Clone> ComponentCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<T> {
        self.read().get(key).cloned()
    }

    pub fn insert(&self, key: impl Into<String>, value: T) {
        self.write().insert(key.into(), value);
    }

    pub fn remove(&self, key: &str) -> Option<T> {
        self.write().remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.read().contains_key(key)
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    // A panic while holding the lock cannot leave the map half-written.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, T>> {
        match self.entries.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, T>> {
        match self.entries.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<T> Debug for ComponentCache<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentCache").finish_non_exhaustive()
    }
}

/// Async import of one component, retried with a fixed delay.
pub struct LazyLoader<T> {
    key: String,
    import: ImportFn<T>,
    options: LazyOptions,
    cache: ComponentCache<T>,
}

impl<T> Clone for LazyLoader<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            import: self.import.clone(),
            options: self.options.clone(),
            cache: self.cache.clone(),
        }
    }
}

impl<T> LazyLoader<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new<F, Fut>(key: impl Into<String>, import: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ImportError>> + Send + 'static,
    {
        let wrapped: ImportFn<T> = Arc::new(move || -> ImportFuture<T> { Box::pin(import()) });
        Self {
            key: key.into(),
            import: wrapped,
            options: LazyOptions::default(),
            cache: ComponentCache::default(),
        }
    }

    pub fn options(mut self, options: LazyOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_cache(mut self, cache: ComponentCache<T>) -> Self {
        self.cache = cache;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn lazy_options(&self) -> &LazyOptions {
        &self.options
    }

    pub fn cache(&self) -> &ComponentCache<T> {
        &self.cache
    }

    pub async fn load(&self) -> Result<LoadReport<T>, LazyError> {
        if self.options.cache {
            if let Some(value) = self.cache.get(&self.key) {
                return Ok(LoadReport {
                    value,
                    attempts: 0,
                    retry_delays: Vec::new(),
                    cached: true,
                });
            }
        }

        let attempts = self.options.attempts();
        let mut retry_delays = Vec::new();
        let mut last = String::new();
        for attempt in 1..=attempts {
            match (self.import)().await {
                Ok(value) => {
                    if self.options.cache {
                        self.cache.insert(self.key.clone(), value.clone());
                    }
                    return Ok(LoadReport {
                        value,
                        attempts: attempt,
                        retry_delays,
                        cached: false,
                    });
                }
                Err(error) => {
                    last = error.to_string();
                    if attempt < attempts {
                        tracing::warn!(
                            key = %self.key,
                            attempt,
                            attempts,
                            error = %last,
                            "lazy component failed to load, retrying"
                        );
                        Delay::new(self.options.retry_delay).await;
                        retry_delays.push(self.options.retry_delay);
                    }
                }
            }
        }

        Err(LazyError::Exhausted {
            key: self.key.clone(),
            attempts,
            last,
        })
    }

    /// Loads into the cache, logging and discarding any failure.
    pub async fn preload(&self) {
        if let Err(error) = self.load().await {
            tracing::warn!(key = %self.key, %error, "lazy component preload failed");
        }
    }

    /// Preload future for `Eager` and `Prefetch` loaders; `None` for `Lazy`.
    pub fn startup_task(&self) -> Option<impl Future<Output = ()> + Send + use<T>> {
        match self.options.strategy {
            LoadStrategy::Lazy => None,
            LoadStrategy::Eager | LoadStrategy::Prefetch => {
                let loader = self.clone();
                Some(async move { loader.preload().await })
            }
        }
    }
}

impl<T> Debug for LazyLoader<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyLoader")
            .field("key", &self.key)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Builds loaders sharing one option set and one cache.
pub fn lazy_batch<T, I, F, Fut>(
    imports: I,
    options: LazyOptions,
    cache: &ComponentCache<T>,
) -> BTreeMap<String, LazyLoader<T>>
where
    T: Clone + Send + Sync + 'static,
    I: IntoIterator<Item = (String, F)>,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, ImportError>> + Send + 'static,
{
    imports
        .into_iter()
        .map(|(key, import)| {
            let loader = LazyLoader::new(key.clone(), import)
                .options(options.clone())
                .with_cache(cache.clone());
            (key, loader)
        })
        .collect()
}

#[derive(Clone, Debug, PartialEq)]
pub enum SlotState<T> {
    Pending,
    Ready(T),
    Failed(LazyError),
}

/// Failure placeholder text with its retry action label.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LazyFallback {
    pub message: String,
    pub retry_label: String,
}

/// Render-side state of one lazily loaded component.
#[derive(Debug)]
pub struct LazySlot<T> {
    loader: LazyLoader<T>,
    state: SlotState<T>,
}

impl<T> LazySlot<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(loader: LazyLoader<T>) -> Self {
        Self {
            loader,
            state: SlotState::Pending,
        }
    }

    pub fn state(&self) -> &SlotState<T> {
        &self.state
    }

    /// Loads once; later calls return the settled state until [`LazySlot::reset`].
    pub async fn resolve(&mut self) -> &SlotState<T> {
        if matches!(self.state, SlotState::Pending) {
            self.state = match self.loader.load().await {
                Ok(report) => SlotState::Ready(report.value),
                Err(error) => SlotState::Failed(error),
            };
        }
        &self.state
    }

    pub fn reset(&mut self) {
        self.state = SlotState::Pending;
    }

    pub fn fallback(&self, i18n: &I18nManager) -> Option<LazyFallback> {
        match self.state {
            SlotState::Failed(_) => Some(LazyFallback {
                message: i18n.t("lazy.load_failed"),
                retry_label: i18n.t("lazy.retry"),
            }),
            _ => None,
        }
    }
}
