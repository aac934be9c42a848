use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};

use crate::{api::SESSION_COOKIE, config, warning};

/// Holds the backend session cookie between requests.
///
/// An in-memory jar lives as long as the value; a persistent jar also writes
/// the cookie to the local data directory so that separate CLI invocations
/// share one backend session.
#[derive(Debug, Clone, Default)]
pub struct SessionJar {
    cookie: Arc<Mutex<Option<String>>>,
    path: Option<PathBuf>,
}

impl SessionJar {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Loads the jar from `<data_local_dir>/vinylspin/cache/session`.
    pub async fn persistent() -> Self {
        let path = Self::cookie_path();
        let cookie = async_fs::read_to_string(&path)
            .await
            .ok()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        Self {
            cookie: Arc::new(Mutex::new(cookie)),
            path: Some(path),
        }
    }

    /// `Cookie` header value for the next request, if a session is known.
    pub fn header(&self) -> Option<String> {
        self.lock()
            .as_ref()
            .map(|value| format!("{SESSION_COOKIE}={value}"))
    }

    /// Picks the session cookie out of a `Set-Cookie` header.
    ///
    /// Returns `true` when the stored cookie changed.
    pub async fn absorb(&self, set_cookie: &str) -> bool {
        let Some((name, value)) = set_cookie
            .split(';')
            .next()
            .and_then(|pair| pair.trim().split_once('='))
        else {
            return false;
        };
        if name != SESSION_COOKIE || value.is_empty() {
            return false;
        }

        {
            let mut cookie = self.lock();
            if cookie.as_deref() == Some(value) {
                return false;
            }
            *cookie = Some(value.to_string());
        }

        if let Err(e) = self.persist(value).await {
            warning!("Failed to save session cookie: {}", e);
        }
        true
    }

    async fn persist(&self, value: &str) -> Result<(), String> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            async_fs::create_dir_all(parent)
                .await
                .map_err(|e| e.to_string())?;
        }
        async_fs::write(path, value).await.map_err(|e| e.to_string())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.cookie
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn cookie_path() -> PathBuf {
        let mut path = config::data_dir();
        path.push("cache/session");
        path
    }
}
