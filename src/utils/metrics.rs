use prometheus::{Counter, CounterVec, HistogramVec, Registry};

/// Prometheus Metrics für Action-Durchläufe, Fehlerquoten, etc.
pub struct Metrics {
    pub registry: Registry,
    pub action_duration: HistogramVec,
    pub actions_total: CounterVec,
    pub datasets_migrated: Counter,
    pub archive_failures: Counter,
    pub user_lookup_failures: Counter,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let action_duration = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "action_duration_seconds",
                "Action execution latency in seconds",
            ),
            &["action"],
        )
        .expect("Failed to create action_duration metric");

        let actions_total = CounterVec::new(
            prometheus::Opts::new("actions_total", "Total actions processed"),
            &["action", "status"],
        )
        .expect("Failed to create actions_total metric");

        let datasets_migrated = Counter::new(
            "datasets_migrated_total",
            "Datasets created or confirmed in the target region",
        )
        .expect("Failed to create datasets_migrated metric");

        let archive_failures = Counter::new(
            "archive_failures_total",
            "Archive records that could not be written",
        )
        .expect("Failed to create archive_failures metric");

        let user_lookup_failures = Counter::new(
            "user_lookup_failures_total",
            "Fatal user lookups before dispatch",
        )
        .expect("Failed to create user_lookup_failures metric");

        registry.register(Box::new(action_duration.clone())).ok();
        registry.register(Box::new(actions_total.clone())).ok();
        registry.register(Box::new(datasets_migrated.clone())).ok();
        registry.register(Box::new(archive_failures.clone())).ok();
        registry.register(Box::new(user_lookup_failures.clone())).ok();

        Self {
            registry,
            action_duration,
            actions_total,
            datasets_migrated,
            archive_failures,
            user_lookup_failures,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
