use axum::body::Body;
use axum::http::{header, HeaderValue, Request, Response};
use axum::middleware::Next;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

pub fn security_headers<B>(mut response: Response<B>) -> Response<B> {
    let headers = response.headers_mut();

    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static(
            "default-src 'self'; img-src 'self' data:; frame-ancestors 'none'; base-uri 'self'; form-action 'self'",
        ),
    );

    response
}

pub async fn apply_security_headers(request: Request<Body>, next: Next) -> Response<Body> {
    let response = next.run(request).await;
    security_headers(response)
}

/// Failed-login counter keyed by normalized email.
///
/// After `max_attempts` failures inside `lockout`, further attempts for that
/// key are refused until the oldest failure ages out.
pub struct LoginThrottle {
    attempts: Mutex<HashMap<String, Vec<Instant>>>,
    max_attempts: usize,
    lockout: Duration,
}

impl Default for LoginThrottle {
    fn default() -> Self {
        Self::new(5, Duration::from_secs(900))
    }
}

impl LoginThrottle {
    pub fn new(max_attempts: usize, lockout: Duration) -> Self {
        Self {
            attempts: Mutex::new(HashMap::new()),
            max_attempts,
            lockout,
        }
    }

    // a panic while holding the lock only loses counters
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Vec<Instant>>> {
        self.attempts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn check(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut attempts = self.lock();
        let Some(entry) = attempts.get_mut(key) else {
            return true;
        };
        entry.retain(|t| now.duration_since(*t) < self.lockout);
        let allowed = entry.len() < self.max_attempts;
        if entry.is_empty() {
            attempts.remove(key);
        }
        allowed
    }

    /// Records a failure for `key` and forgets every key whose failures have
    /// all aged out, so the map only holds keys failing within `lockout`.
    pub fn record_failure(&self, key: &str) {
        let now = Instant::now();
        let mut attempts = self.lock();
        attempts.retain(|_, failures| {
            failures.retain(|t| now.duration_since(*t) < self.lockout);
            !failures.is_empty()
        });
        attempts.entry(key.to_string()).or_default().push(now);
    }

    pub fn clear(&self, key: &str) {
        self.lock().remove(key);
    }

    #[cfg(test)]
    pub(crate) fn tracked_keys(&self) -> usize {
        self.lock().len()
    }
}
