//! Metrics setup and update for the pipeline.

use std::time::Duration;

use prometheus::core::{AtomicF64, AtomicI64, AtomicU64, GenericCounter, GenericGauge};
use prometheus::{Histogram, HistogramOpts, IntCounterVec, Opts};

#[derive(Debug, Clone)]
pub struct Metrics {
    pub query_total: GenericCounter<AtomicU64>,
    pub query_errors_total: IntCounterVec,
    pub query_latency: Histogram,
    pub pool_size: GenericGauge<AtomicI64>,
    pub pool_idle_count: GenericGauge<AtomicI64>,
    pub pool_active_count: GenericGauge<AtomicI64>,
    pub pool_max_connections: GenericGauge<AtomicI64>,
    pub pool_acquire_timeout: GenericGauge<AtomicF64>,
}

impl Metrics {
    /// Set up counters and gauges used to produce Prometheus metrics.
    pub fn initialize(metrics_registry: &mut prometheus::Registry) -> Result<Self, prometheus::Error> {
        let query_total = add_int_counter_metric(
            metrics_registry,
            "nl_sql_query_total",
            "Total successfully answered questions.",
        )?;

        let query_errors_total = IntCounterVec::new(
            Opts::new("nl_sql_query_errors_total", "Total failed questions, by error kind."),
            &["kind"],
        )?;
        metrics_registry.register(Box::new(query_errors_total.clone()))?;

        let query_latency = Histogram::with_opts(HistogramOpts::new(
            "nl_sql_query_latency_seconds",
            "Time taken to answer a question, from receipt to the recorded trace.",
        ))?;
        metrics_registry.register(Box::new(query_latency.clone()))?;

        let pool_size = add_int_gauge_metric(
            metrics_registry,
            "nl_sql_pool_size",
            "The number of connections currently active. This includes idle connections.",
        )?;

        let pool_idle_count = add_int_gauge_metric(
            metrics_registry,
            "nl_sql_pool_idle",
            "The number of connections active and idle (not in use).",
        )?;

        let pool_active_count = add_int_gauge_metric(
            metrics_registry,
            "nl_sql_pool_active",
            "The number of connections current active. This does not include idle connections.",
        )?;

        let pool_max_connections = add_int_gauge_metric(
            metrics_registry,
            "nl_sql_pool_max_connections",
            "The maximum number of connections that this pool should maintain.",
        )?;

        let pool_acquire_timeout = add_gauge_metric(
            metrics_registry,
            "nl_sql_pool_acquire_timeout",
            "Get the maximum amount of time to spend waiting for a connection, in seconds.",
        )?;

        Ok(Metrics {
            query_total,
            query_errors_total,
            query_latency,
            pool_size,
            pool_idle_count,
            pool_active_count,
            pool_max_connections,
            pool_acquire_timeout,
        })
    }

    pub fn record_query(&self) {
        self.query_total.inc();
    }

    /// Count a failure under its error kind, e.g. `completion-empty`.
    pub fn record_error(&self, kind: &str) {
        self.query_errors_total.with_label_values(&[kind]).inc();
    }

    pub fn observe_latency(&self, latency: Duration) {
        self.query_latency.observe(latency.as_secs_f64());
    }

    // update all pool gauges
    pub fn update_pool_metrics(&self, pool: &sqlx::PgPool) {
        let pool_size: i64 = pool.size().into();
        self.pool_size.set(pool_size);

        let pool_idle: i64 = i64::try_from(pool.num_idle()).unwrap_or(i64::MAX);
        self.pool_idle_count.set(pool_idle);

        self.pool_active_count.set(pool_size - pool_idle);

        let pool_options = pool.options();

        let max_connections: i64 = pool_options.get_max_connections().into();
        self.pool_max_connections.set(max_connections);

        let acquire_timeout: f64 = pool_options.get_acquire_timeout().as_secs_f64();
        self.pool_acquire_timeout.set(acquire_timeout);
    }
}

/// Create a new int counter metric and register it with the provided Prometheus Registry
fn add_int_counter_metric(
    metrics_registry: &mut prometheus::Registry,
    metric_name: &str,
    metric_description: &str,
) -> Result<GenericCounter<AtomicU64>, prometheus::Error> {
    let int_counter =
        prometheus::IntCounter::with_opts(Opts::new(metric_name, metric_description))?;
    metrics_registry.register(Box::new(int_counter.clone()))?;
    Ok(int_counter)
}

/// Create a new int gauge metric and register it with the provided Prometheus Registry
fn add_int_gauge_metric(
    metrics_registry: &mut prometheus::Registry,
    metric_name: &str,
    metric_description: &str,
) -> Result<GenericGauge<AtomicI64>, prometheus::Error> {
    let int_gauge = prometheus::IntGauge::with_opts(Opts::new(metric_name, metric_description))?;
    metrics_registry.register(Box::new(int_gauge.clone()))?;
    Ok(int_gauge)
}

/// Create a new gauge metric and register it with the provided Prometheus Registry
fn add_gauge_metric(
    metrics_registry: &mut prometheus::Registry,
    metric_name: &str,
    metric_description: &str,
) -> Result<GenericGauge<AtomicF64>, prometheus::Error> {
    let gauge = prometheus::Gauge::with_opts(Opts::new(metric_name, metric_description))?;
    metrics_registry.register(Box::new(gauge.clone()))?;
    Ok(gauge)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_are_registered_and_exported() {
        let mut registry = prometheus::Registry::new();
        let metrics = Metrics::initialize(&mut registry).unwrap();

        metrics.record_query();
        metrics.record_query();
        metrics.record_error("completion-empty");
        metrics.observe_latency(Duration::from_millis(120));

        let families = registry.gather();
        let value_of = |name: &str| {
            families
                .iter()
                .find(|family| family.get_name() == name)
                .map(|family| family.get_metric()[0].clone())
        };

        assert_eq!(
            value_of("nl_sql_query_total").unwrap().get_counter().get_value(),
            2.0
        );
        let errors = value_of("nl_sql_query_errors_total").unwrap();
        assert_eq!(errors.get_label()[0].get_value(), "completion-empty");
        assert_eq!(errors.get_counter().get_value(), 1.0);
        assert_eq!(
            value_of("nl_sql_query_latency_seconds")
                .unwrap()
                .get_histogram()
                .get_sample_count(),
            1
        );
    }

    #[test]
    fn registering_twice_fails() {
        let mut registry = prometheus::Registry::new();
        Metrics::initialize(&mut registry).unwrap();
        assert!(Metrics::initialize(&mut registry).is_err());
    }
}
