//! # Metrics
//!
//! Prometheus registry for the HTTP surface. Rendered in text exposition
//! format on `/metrics`.

use std::fmt;

use domains::VoteTransition;
use prometheus_client::encoding::text::encode;
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::registry::Registry;

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct RequestLabels {
    pub method: String,
    pub route: String,
    pub status: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct VoteLabels {
    pub transition: String,
}

pub struct Metrics {
    registry: Registry,
    http_requests: Family<RequestLabels, Counter>,
    posts_created: Counter,
    votes: Family<VoteLabels, Counter>,
}

impl Metrics {
    pub fn new() -> Self {
        let mut registry = Registry::with_prefix("forum");
        let http_requests = Family::<RequestLabels, Counter>::default();
        let posts_created = Counter::default();
        let votes = Family::<VoteLabels, Counter>::default();

        registry.register("http_requests", "HTTP requests served", http_requests.clone());
        registry.register("posts_created", "Posts stored by creation batches", posts_created.clone());
        registry.register("votes", "Votes applied, by transition", votes.clone());

        Self { registry, http_requests, posts_created, votes }
    }

    pub fn record_request(&self, method: &str, route: &str, status: u16) {
        self.http_requests
            .get_or_create(&RequestLabels {
                method: method.to_string(),
                route: route.to_string(),
                status: status.to_string(),
            })
            .inc();
    }

    pub fn record_posts(&self, count: usize) {
        self.posts_created.inc_by(count as u64);
    }

    pub fn record_vote(&self, transition: VoteTransition) {
        self.votes
            .get_or_create(&VoteLabels { transition: transition.label().to_string() })
            .inc();
    }

    pub fn render(&self) -> Result<String, fmt::Error> {
        let mut buffer = String::new();
        encode(&mut buffer, &self.registry)?;
        Ok(buffer)
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
