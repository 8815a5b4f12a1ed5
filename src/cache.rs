//! Converter cache.
//!
//! Keeps one converter per distinct [`ResolvedConfig`] for the life of the
//! server. Each key owns a `OnceCell`, so concurrent requests for the same
//! configuration wait on a single construction while unrelated keys build
//! independently. Failed constructions are not cached and leave no slot
//! behind.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::OnceCell;

use crate::converter::{ConverterFactory, ResolvedConfig, TextConverter};
use crate::error::{McpError, Result};

type Slot = Arc<OnceCell<Arc<dyn TextConverter>>>;

/// Get-or-create cache of converters keyed by configuration value.
pub struct ConverterCache {
    factory: Arc<dyn ConverterFactory>,
    slots: Mutex<HashMap<ResolvedConfig, Slot>>,
}

impl ConverterCache {
    /// Create an empty cache building converters with `factory`.
    pub fn new(factory: Arc<dyn ConverterFactory>) -> Self {
        Self {
            factory,
            slots: Mutex::new(HashMap::new()),
        }
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<ResolvedConfig, Slot>> {
        // The map is only touched for insert/lookup, a poisoned guard is still consistent.
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Return the converter for `config`, building it on first use.
    pub async fn get_or_create(&self, config: &ResolvedConfig) -> Result<Arc<dyn TextConverter>> {
        let slot = Arc::clone(self.slots().entry(config.clone()).or_default());

        let result = slot
            .get_or_try_init(|| async {
                let factory = Arc::clone(&self.factory);
                let key = config.clone();
                tracing::info!(
                    separator = %key.separator,
                    use_custom_readings = key.use_custom_readings,
                    use_unidic = key.use_unidic,
                    dict_type = %key.dict_type,
                    "Building converter"
                );
                tokio::task::spawn_blocking(move || factory.build(&key))
                    .await
                    .map_err(|e| {
                        McpError::Invocation(format!("converter construction failed: {}", e))
                    })?
            })
            .await;

        match result {
            Ok(converter) => Ok(Arc::clone(converter)),
            Err(e) => {
                self.evict_empty(config, &slot);
                Err(e)
            }
        }
    }

    /// Drop the slot for `config` if it is still `slot` and holds nothing.
    fn evict_empty(&self, config: &ResolvedConfig, slot: &Slot) {
        let mut slots = self.slots();
        if slots
            .get(config)
            .is_some_and(|current| Arc::ptr_eq(current, slot) && !current.initialized())
        {
            slots.remove(config);
        }
    }

    /// Build converters ahead of the first request.
    pub async fn preseed(&self, configs: impl IntoIterator<Item = ResolvedConfig>) -> Result<()> {
        for config in configs {
            self.get_or_create(&config).await?;
        }
        Ok(())
    }

    /// Whether a converter for `config` has been built.
    pub fn contains(&self, config: &ResolvedConfig) -> bool {
        self.slots()
            .get(config)
            .is_some_and(|slot| slot.initialized())
    }

    /// Number of converters built.
    pub fn len(&self) -> usize {
        self.slots().values().filter(|slot| slot.initialized()).count()
    }

    /// Whether no converter has been built yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct Echo;

    impl TextConverter for Echo {
        fn to_hiragana(&self, text: &str) -> Result<String> {
            Ok(text.to_string())
        }
        fn to_katakana(&self, text: &str) -> Result<String> {
            Ok(text.to_string())
        }
        fn to_roman(&self, text: &str) -> Result<String> {
            Ok(text.to_string())
        }
    }

    #[derive(Default)]
    struct CountingFactory {
        builds: AtomicUsize,
        fail_next: std::sync::atomic::AtomicBool,
    }

    impl ConverterFactory for CountingFactory {
        fn build(&self, _config: &ResolvedConfig) -> Result<Arc<dyn TextConverter>> {
            if self.fail_next.swap(false, Ordering::SeqCst) {
                return Err(McpError::Invocation("dictionary unavailable".to_string()));
            }
            std::thread::sleep(Duration::from_millis(20));
            self.builds.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(Echo))
        }
    }

    #[tokio::test]
    async fn test_equal_configs_share_instance() {
        let factory = Arc::new(CountingFactory::default());
        let cache = ConverterCache::new(factory.clone());

        let a = cache.get_or_create(&ResolvedConfig::default()).await.unwrap();
        let b = cache
            .get_or_create(&ResolvedConfig::with_separator("/"))
            .await
            .unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        let c = cache
            .get_or_create(&ResolvedConfig::with_separator("-"))
            .await
            .unwrap();
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(factory.builds.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_requests_build_once() {
        let factory = Arc::new(CountingFactory::default());
        let cache = Arc::new(ConverterCache::new(factory.clone()));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let cache = Arc::clone(&cache);
                tokio::spawn(async move {
                    cache
                        .get_or_create(&ResolvedConfig::with_separator(" "))
                        .await
                        .map(|_| ())
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(factory.builds.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_build_is_retried() {
        let factory = Arc::new(CountingFactory::default());
        factory.fail_next.store(true, Ordering::SeqCst);
        let cache = ConverterCache::new(factory.clone());
        let config = ResolvedConfig::default();

        let err = cache.get_or_create(&config).await.err().unwrap();
        assert_eq!(err.to_string(), "dictionary unavailable");
        assert!(!cache.contains(&config));

        cache.get_or_create(&config).await.unwrap();
        assert!(cache.contains(&config));
        assert_eq!(factory.builds.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_builds_leave_no_slots() {
        let factory = Arc::new(CountingFactory::default());
        let cache = ConverterCache::new(factory.clone());

        for sep in ["a", "b", "c"] {
            factory.fail_next.store(true, Ordering::SeqCst);
            assert!(cache
                .get_or_create(&ResolvedConfig::with_separator(sep))
                .await
                .is_err());
        }
        assert_eq!(cache.slots().len(), 0);

        let config = ResolvedConfig::default();
        cache.get_or_create(&config).await.unwrap();
        assert!(cache.contains(&config));
        assert_eq!(factory.builds.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_preseed_builds_presets() {
        let factory = Arc::new(CountingFactory::default());
        let cache = ConverterCache::new(factory.clone());
        assert!(cache.is_empty());

        cache.preseed(ResolvedConfig::presets()).await.unwrap();
        assert_eq!(cache.len(), 3);
        assert!(cache.contains(&ResolvedConfig::with_separator("")));
    }
}
