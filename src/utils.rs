use async_trait::async_trait;
use once_cell::sync::Lazy;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::cell::RefCell;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use url::Url;

pub static RUNTIME: Lazy<tokio::runtime::Runtime> = Lazy::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to build Tokio runtime")
});

/// Runs `fut` on the shared Tokio runtime and waits for it from whatever
/// executor the caller is on (the GLib main context in the GUI).
pub async fn run_on_runtime<T, Fut>(fut: Fut) -> Result<T, tokio::task::JoinError>
where
    T: Send + 'static,
    Fut: std::future::Future<Output = T> + Send + 'static,
{
    RUNTIME.spawn(fut).await
}

pub fn normalize_url(input: &str) -> String {
    let trimmed = input.trim();
    let with_scheme = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };
    with_scheme.trim_end_matches('/').to_string()
}

/// Parses a base URL for an HTTP API. A URL without a host is rejected.
pub fn parse_endpoint(input: &str) -> Result<Url, url::ParseError> {
    let url = Url::parse(&normalize_url(input))?;
    if url.host_str().is_none_or(str::is_empty) {
        return Err(url::ParseError::EmptyHost);
    }
    Ok(url)
}

/// Suspends the caller for a fixed duration.
#[async_trait(?Send)]
pub trait Delay {
    async fn wait(&self, duration: Duration);
}

pub struct TokioDelay;

#[async_trait(?Send)]
impl Delay for TokioDelay {
    async fn wait(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[cfg(feature = "gui")]
pub struct GlibDelay;

#[cfg(feature = "gui")]
#[async_trait(?Send)]
impl Delay for GlibDelay {
    async fn wait(&self, duration: Duration) {
        glib::timeout_future(duration).await;
    }
}

/// Fire-and-forget timers on the caller's event loop.
pub trait Timers {
    fn schedule(&self, after: Duration, task: Box<dyn FnOnce()>);
}

#[cfg(feature = "gui")]
pub struct GlibTimers;

#[cfg(feature = "gui")]
impl Timers for GlibTimers {
    fn schedule(&self, after: Duration, task: Box<dyn FnOnce()>) {
        glib::timeout_add_local_once(after, task);
    }
}

pub trait Clock {
    fn now_millis(&self) -> i64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or_default()
    }
}

/// Uniform draws in `[0, 1)`.
pub trait RandomSource {
    fn next_unit(&self) -> f64;
}

pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_unit(&self) -> f64 {
        rand::thread_rng().r#gen::<f64>()
    }
}

pub struct SeededRandom(RefCell<StdRng>);

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self(RefCell::new(StdRng::seed_from_u64(seed)))
    }
}

impl RandomSource for SeededRandom {
    fn next_unit(&self) -> f64 {
        self.0.borrow_mut().r#gen::<f64>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_url_adds_scheme_and_drops_trailing_slash() {
        assert_eq!(normalize_url("example.com/v1beta/"), "https://example.com/v1beta");
        assert_eq!(normalize_url(" http://localhost:8080 "), "http://localhost:8080");
    }

    #[test]
    fn parse_endpoint_rejects_garbage() {
        assert!(parse_endpoint("http://").is_err());
        assert!(parse_endpoint("https:///").is_err());
        assert_eq!(normalize_url("http://"), "http:");
        assert!(parse_endpoint("generativelanguage.googleapis.com").is_ok());
    }

    #[tokio::test]
    async fn tokio_delay_waits_at_least_the_duration() {
        let start = std::time::Instant::now();
        TokioDelay.wait(Duration::from_millis(20)).await;
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[tokio::test]
    async fn run_on_runtime_returns_the_task_output() {
        let value = run_on_runtime(async { 40 + 2 }).await.unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn seeded_random_is_reproducible_and_in_range() {
        let a = SeededRandom::new(7);
        let b = SeededRandom::new(7);
        for _ in 0..32 {
            let x = a.next_unit();
            assert!((0.0..1.0).contains(&x));
            assert_eq!(x, b.next_unit());
        }
    }

    #[test]
    fn production_sources_look_sane() {
        assert!((0.0..1.0).contains(&ThreadRandom.next_unit()));
        // Any date after 2020-01-01.
        assert!(SystemClock.now_millis() > 1_577_836_800_000);
    }
}
