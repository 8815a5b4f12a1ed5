//! Process wide server state.
//!
//! Built once at startup and handed to the server: the tool catalog, the
//! converter cache and the dispatcher over both.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::ConverterCache;
use crate::converter::{ConverterFactory, LexiconFactory, ResolvedConfig};
use crate::dispatch::Dispatcher;
use crate::error::Result;
use crate::tools::ToolRegistry;

/// Runtime settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Directory holding reading lexicons.
    pub dict_dir: Option<PathBuf>,
    /// Bound on a single conversion.
    pub timeout: Option<Duration>,
    /// Build the separator presets before serving.
    pub preseed: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            dict_dir: None,
            timeout: Some(Duration::from_secs(30)),
            preseed: true,
        }
    }
}

/// Shared server state.
pub struct ServerContext {
    config: ServerConfig,
    registry: Arc<ToolRegistry>,
    cache: Arc<ConverterCache>,
    dispatcher: Dispatcher,
}

impl ServerContext {
    /// Create a context building converters with `factory`.
    pub fn new(config: ServerConfig, factory: Arc<dyn ConverterFactory>) -> Self {
        let registry = Arc::new(ToolRegistry::new());
        let cache = Arc::new(ConverterCache::new(factory));
        let dispatcher = Dispatcher::new(Arc::clone(&registry), Arc::clone(&cache), config.timeout);

        Self {
            config,
            registry,
            cache,
            dispatcher,
        }
    }

    /// Create a context using the built-in lexicon converter.
    pub fn with_lexicons(config: ServerConfig) -> Self {
        let factory = Arc::new(LexiconFactory::new(config.dict_dir.clone()));
        Self::new(config, factory)
    }

    /// Build the preset converters, if enabled.
    pub async fn warm(&self) -> Result<()> {
        if !self.config.preseed {
            return Ok(());
        }
        self.cache.preseed(ResolvedConfig::presets()).await?;
        tracing::info!(converters = self.cache.len(), "Converter cache warmed");
        Ok(())
    }

    /// Runtime settings.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Tool catalog.
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Converter cache.
    pub fn cache(&self) -> &ConverterCache {
        &self.cache
    }

    /// Tool call dispatcher.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }
}
