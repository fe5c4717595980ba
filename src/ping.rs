use std::collections::{HashMap, HashSet};

use log::{debug, info, warn};

use crate::{query_param, Result, ViewtrackError, DEDUP_QUERY_KEY};

/// Transport seam for the fire-and-forget view-count notification.
///
/// Implementations must not block: the ping is best-effort and failures are
/// the transport's problem, not the caller's.
pub trait PingSink: Send + Sync {
    fn send(&self, url: &str);
}

/// Sends pings as HTTP GET requests from a spawned task.
pub struct HttpPingSink {
    client: reqwest::Client,
}

impl HttpPingSink {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpPingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl PingSink for HttpPingSink {
    fn send(&self, url: &str) {
        let client = self.client.clone();
        let url = url.to_string();
        tokio::spawn(async move {
            match client.get(&url).send().await {
                Ok(response) => debug!("view-count ping {} -> {}", url, response.status()),
                Err(e) => warn!("view-count ping to {} failed: {}", url, e),
            }
        });
    }
}

/// Logs pings instead of sending them (dry-run mode).
pub struct LogPingSink;

impl PingSink for LogPingSink {
    fn send(&self, url: &str) {
        info!("dry-run view-count ping: {}", url);
    }
}

/// Per-session view-count state: configured endpoints plus the record of
/// which pings have already gone out.
///
/// One registry per page session; every component that issues pings gets a
/// handle to the same instance so deduplication is session-wide.
pub struct PingRegistry {
    default_url: Option<String>,
    urls_by_id: HashMap<String, String>,
    pinged: HashSet<String>,
    sink: Box<dyn PingSink>,
}

impl PingRegistry {
    pub fn new(sink: Box<dyn PingSink>) -> Self {
        Self {
            default_url: None,
            urls_by_id: HashMap::new(),
            pinged: HashSet::new(),
            sink,
        }
    }

    /// Configure the endpoint, either the session default or for one video id.
    pub fn set_endpoint(&mut self, url: impl Into<String>, id: Option<&str>) {
        match id {
            Some(id) => {
                self.urls_by_id.insert(id.to_string(), url.into());
            }
            None => self.default_url = Some(url.into()),
        }
    }

    /// The endpoint that would be pinged for `id`, falling back to the
    /// session default when no override exists.
    pub fn endpoint(&self, id: Option<&str>) -> Option<&str> {
        id.and_then(|id| self.urls_by_id.get(id))
            .or(self.default_url.as_ref())
            .map(String::as_str)
    }

    /// Fire the view-count ping for `id` unless an equivalent ping already
    /// went out this session.
    ///
    /// The dedup key is the endpoint's `svalue` query parameter; endpoints
    /// without one dedupe on the full URL so distinct URLs still each ping
    /// once. Returns whether a ping was actually sent.
    pub fn ping(&mut self, id: Option<&str>) -> Result<bool> {
        let url = self
            .endpoint(id)
            .ok_or(ViewtrackError::EndpointNotSet)?
            .to_string();

        let key = query_param(DEDUP_QUERY_KEY, &url).unwrap_or_else(|| url.clone());
        if !self.pinged.insert(key) {
            debug!("view-count ping for {} already sent, skipping", url);
            return Ok(false);
        }

        self.sink.send(&url);
        Ok(true)
    }

    /// Whether any view-count ping has been sent this session
    pub fn has_pinged(&self) -> bool {
        !self.pinged.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct RecordingSink {
        sent: Arc<Mutex<Vec<String>>>,
    }

    impl PingSink for RecordingSink {
        fn send(&self, url: &str) {
            self.sent.lock().unwrap().push(url.to_string());
        }
    }

    fn registry_with_recorder() -> (PingRegistry, RecordingSink) {
        let sink = RecordingSink::default();
        (PingRegistry::new(Box::new(sink.clone())), sink)
    }

    #[test]
    fn ping_without_endpoint_is_an_error() {
        let (mut registry, _sink) = registry_with_recorder();
        assert!(matches!(
            registry.ping(None),
            Err(ViewtrackError::EndpointNotSet)
        ));
        assert!(!registry.has_pinged());
    }

    #[test]
    fn pings_default_endpoint_once() {
        let (mut registry, sink) = registry_with_recorder();
        registry.set_endpoint("https://cnt.example.com/ping?svalue=v1", None);

        assert!(registry.ping(None).unwrap());
        assert!(!registry.ping(None).unwrap());
        assert_eq!(
            *sink.sent.lock().unwrap(),
            vec!["https://cnt.example.com/ping?svalue=v1".to_string()]
        );
        assert!(registry.has_pinged());
    }

    #[test]
    fn per_id_endpoint_overrides_default() {
        let (mut registry, sink) = registry_with_recorder();
        registry.set_endpoint("https://cnt.example.com/ping?svalue=default", None);
        registry.set_endpoint("https://cnt.example.com/ping?svalue=special", Some("vid-2"));

        assert_eq!(
            registry.endpoint(Some("vid-2")),
            Some("https://cnt.example.com/ping?svalue=special")
        );
        assert_eq!(
            registry.endpoint(Some("vid-1")),
            Some("https://cnt.example.com/ping?svalue=default")
        );

        assert!(registry.ping(Some("vid-2")).unwrap());
        assert!(registry.ping(Some("vid-1")).unwrap());
        assert_eq!(sink.sent.lock().unwrap().len(), 2);
    }

    #[test]
    fn dedup_key_is_svalue_not_full_url() {
        let (mut registry, sink) = registry_with_recorder();
        registry.set_endpoint("https://a.example.com/ping?svalue=same&t=1", Some("vid-1"));
        registry.set_endpoint("https://b.example.com/ping?svalue=same&t=2", Some("vid-2"));

        assert!(registry.ping(Some("vid-1")).unwrap());
        // Different URL, same svalue: already counted
        assert!(!registry.ping(Some("vid-2")).unwrap());
        assert_eq!(sink.sent.lock().unwrap().len(), 1);
    }

    #[test]
    fn endpoints_without_svalue_dedupe_on_full_url() {
        let (mut registry, sink) = registry_with_recorder();
        registry.set_endpoint("https://a.example.com/ping", Some("vid-1"));
        registry.set_endpoint("https://b.example.com/ping", Some("vid-2"));

        assert!(registry.ping(Some("vid-1")).unwrap());
        assert!(registry.ping(Some("vid-2")).unwrap());
        assert!(!registry.ping(Some("vid-1")).unwrap());
        assert_eq!(sink.sent.lock().unwrap().len(), 2);
    }

    #[test]
    fn unknown_id_falls_back_to_default_endpoint() {
        let (mut registry, sink) = registry_with_recorder();
        registry.set_endpoint("https://cnt.example.com/ping?svalue=v1", None);

        assert!(registry.ping(Some("never-registered")).unwrap());
        assert_eq!(sink.sent.lock().unwrap().len(), 1);
    }
}
