//! Canonical observability surface (spec.md §6 "Observability surface").
//!
//! Only the Prometheus pull-style exposition format is implemented; the
//! OpenTelemetry push-style option is out of scope (spec.md §1: "telemetry
//! wiring... the core emits structured events and counters but does not
//! own the exporter pipeline").

use prometheus::{CounterVec, GaugeVec, HistogramVec, IntGauge, Opts, Registry};

/// The full set of canonical metrics named in spec.md §6.
pub struct Metrics {
    /// Build metadata gauge, always `1`.
    pub build_info: IntGauge,
    /// `scaler_errors_total{namespace, resource, scaler, trigger_index, metric}`.
    pub scaler_errors_total: CounterVec,
    /// `scaler_metrics_value{namespace, resource, scaler, metric}`.
    pub scaler_metrics_value: GaugeVec,
    /// `scaler_metrics_latency_seconds{namespace, resource, scaler, metric}`.
    pub scaler_metrics_latency_seconds: HistogramVec,
    /// `scaler_active{namespace, resource, scaler}`.
    pub scaler_active: GaugeVec,
    /// `scaled_object_paused{namespace, scaled_object}`.
    pub scaled_object_paused: GaugeVec,
    /// `trigger_registered_count{type}`.
    pub trigger_registered_count: GaugeVec,
    /// `resource_registered_count{type, namespace}`.
    pub resource_registered_count: GaugeVec,
    /// `internal_scale_loop_latency_seconds{namespace, type, resource}`.
    pub internal_scale_loop_latency_seconds: HistogramVec,
}

impl Metrics {
    /// Register every canonical metric against `registry`.
    ///
    /// # Errors
    /// Returns a [`prometheus::Error`] if any metric fails to register
    /// (e.g. a duplicate name).
    pub fn register(registry: &Registry) -> Result<Self, prometheus::Error> {
        let build_info = IntGauge::new("build_info", "always 1; presence indicates the process is up")?;
        registry.register(Box::new(build_info.clone()))?;

        let scaler_errors_total = CounterVec::new(
            Opts::new("scaler_errors_total", "scaler poll/build errors"),
            &["namespace", "resource", "scaler", "trigger_index", "metric"],
        )?;
        registry.register(Box::new(scaler_errors_total.clone()))?;

        let scaler_metrics_value = GaugeVec::new(
            Opts::new("scaler_metrics_value", "last observed scaler metric value"),
            &["namespace", "resource", "scaler", "metric"],
        )?;
        registry.register(Box::new(scaler_metrics_value.clone()))?;

        let scaler_metrics_latency_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new("scaler_metrics_latency_seconds", "per-scaler poll latency"),
            &["namespace", "resource", "scaler", "metric"],
        )?;
        registry.register(Box::new(scaler_metrics_latency_seconds.clone()))?;

        let scaler_active = GaugeVec::new(
            Opts::new("scaler_active", "1 if the scaler last reported active"),
            &["namespace", "resource", "scaler"],
        )?;
        registry.register(Box::new(scaler_active.clone()))?;

        let scaled_object_paused = GaugeVec::new(
            Opts::new("scaled_object_paused", "1 if the target is currently paused"),
            &["namespace", "scaled_object"],
        )?;
        registry.register(Box::new(scaled_object_paused.clone()))?;

        let trigger_registered_count = GaugeVec::new(
            Opts::new("trigger_registered_count", "triggers currently registered, by type"),
            &["type"],
        )?;
        registry.register(Box::new(trigger_registered_count.clone()))?;

        let resource_registered_count = GaugeVec::new(
            Opts::new("resource_registered_count", "targets currently registered, by kind and namespace"),
            &["type", "namespace"],
        )?;
        registry.register(Box::new(resource_registered_count.clone()))?;

        let internal_scale_loop_latency_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new("internal_scale_loop_latency_seconds", "full reconcile-to-decision latency"),
            &["namespace", "type", "resource"],
        )?;
        registry.register(Box::new(internal_scale_loop_latency_seconds.clone()))?;

        build_info.set(1);

        Ok(Self {
            build_info,
            scaler_errors_total,
            scaler_metrics_value,
            scaler_metrics_latency_seconds,
            scaler_active,
            scaled_object_paused,
            trigger_registered_count,
            resource_registered_count,
            internal_scale_loop_latency_seconds,
        })
    }
}
