use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::time::Instant;

/// Prometheus collectors for the HTTP surface, registered on a private
/// registry so several routers can live in one process.
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    requests: IntCounterVec,
    latency: HistogramVec,
    pub payments_created: IntCounter,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let requests = IntCounterVec::new(
            Opts::new("http_requests_total", "HTTP requests handled"),
            &["method", "path", "status"],
        )?;
        let latency = HistogramVec::new(
            HistogramOpts::new("http_request_duration_seconds", "HTTP request latency"),
            &["method", "path"],
        )?;
        let payments_created =
            IntCounter::with_opts(Opts::new("payments_created_total", "Payments recorded"))?;

        registry.register(Box::new(requests.clone()))?;
        registry.register(Box::new(latency.clone()))?;
        registry.register(Box::new(payments_created.clone()))?;

        Ok(Self {
            registry,
            requests,
            latency,
            payments_created,
        })
    }

    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }

    fn observe(&self, method: &str, path: &str, status: u16, started: Instant) {
        self.requests
            .with_label_values(&[method, path, &status.to_string()])
            .inc();
        self.latency
            .with_label_values(&[method, path])
            .observe(started.elapsed().as_secs_f64());
    }
}

pub async fn track_requests(State(metrics): State<Metrics>, req: Request, next: Next) -> Response {
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| req.uri().path().to_owned());
    let method = req.method().to_string();
    let started = Instant::now();

    let response = next.run(req).await;
    metrics.observe(&method, &path, response.status().as_u16(), started);
    response
}
