//! Prometheus metrics

use prometheus::{IntCounter, IntCounterVec, Opts, Registry};

pub struct Metrics {
    pub quotes_total: IntCounter,
    /// Failed quotes by kind ("validation" or "chain")
    pub quote_failures_total: IntCounterVec,
    pub approvals_total: IntCounter,
    pub swaps_submitted_total: IntCounter,
    pub swaps_confirmed_total: IntCounter,
    /// Failed swaps by pipeline step
    pub swaps_failed_total: IntCounterVec,
    /// Admin mutations by action
    pub admin_actions_total: IntCounterVec,
    pub registry: Registry,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let quotes_total = IntCounter::new("fibswap_quotes_total", "Total number of quotes served")
            .expect("constant metric name is valid");

        let quote_failures_total = IntCounterVec::new(
            Opts::new(
                "fibswap_quote_failures_total",
                "Total number of quote requests that failed",
            ),
            &["kind"],
        )
        .expect("constant metric name is valid");

        let approvals_total = IntCounter::new(
            "fibswap_approvals_total",
            "Total number of token approvals confirmed",
        )
        .expect("constant metric name is valid");

        let swaps_submitted_total = IntCounter::new(
            "fibswap_swaps_submitted_total",
            "Total number of sendTokens transactions submitted",
        )
        .expect("constant metric name is valid");

        let swaps_confirmed_total = IntCounter::new(
            "fibswap_swaps_confirmed_total",
            "Total number of transfers confirmed on the source chain",
        )
        .expect("constant metric name is valid");

        let swaps_failed_total = IntCounterVec::new(
            Opts::new("fibswap_swaps_failed_total", "Total number of failed swaps"),
            &["step"],
        )
        .expect("constant metric name is valid");

        let admin_actions_total = IntCounterVec::new(
            Opts::new(
                "fibswap_admin_actions_total",
                "Total number of admin dashboard mutations",
            ),
            &["action"],
        )
        .expect("constant metric name is valid");

        // Names are unique constants and registration runs once per Metrics
        registry
            .register(Box::new(quotes_total.clone()))
            .expect("metric registration must not be called twice");
        registry
            .register(Box::new(quote_failures_total.clone()))
            .expect("metric registration must not be called twice");
        registry
            .register(Box::new(approvals_total.clone()))
            .expect("metric registration must not be called twice");
        registry
            .register(Box::new(swaps_submitted_total.clone()))
            .expect("metric registration must not be called twice");
        registry
            .register(Box::new(swaps_confirmed_total.clone()))
            .expect("metric registration must not be called twice");
        registry
            .register(Box::new(swaps_failed_total.clone()))
            .expect("metric registration must not be called twice");
        registry
            .register(Box::new(admin_actions_total.clone()))
            .expect("metric registration must not be called twice");

        Self {
            quotes_total,
            quote_failures_total,
            approvals_total,
            swaps_submitted_total,
            swaps_confirmed_total,
            swaps_failed_total,
            admin_actions_total,
            registry,
        }
    }

    pub fn quote_failure(&self, validation: bool) {
        let kind = if validation { "validation" } else { "chain" };
        self.quote_failures_total.with_label_values(&[kind]).inc();
    }

    pub fn admin_action(&self, action: &str) {
        self.admin_actions_total.with_label_values(&[action]).inc();
    }
}
