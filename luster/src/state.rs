use std::sync::Arc;

use crate::{cache::Cache, config::ClientConfig, http::HttpHandler};

/// Shared handle to the HTTP handler and the cache.
///
/// Every high-level model carries a `State` so it can act on itself
/// (`channel.delete()`, `message.reply(..)`). Cloning is cheap.
#[derive(Debug, Clone)]
pub struct State {
    inner: Arc<StateInner>,
}

#[derive(Debug)]
struct StateInner {
    http: HttpHandler,
    cache: Cache,
}

impl State {
    pub fn new(http: HttpHandler) -> Self {
        Self {
            inner: Arc::new(StateInner {
                http,
                cache: Cache::new(),
            }),
        }
    }

    pub fn http(&self) -> &HttpHandler {
        &self.inner.http
    }

    pub fn cache(&self) -> &Cache {
        &self.inner.cache
    }

    pub fn config(&self) -> &ClientConfig {
        self.inner.http.config()
    }
}
