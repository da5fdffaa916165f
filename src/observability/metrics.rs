use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub assignments_total: IntCounterVec,
    pub pending_orders: IntGauge,
    pub active_deliveries: IntGauge,
    pub delivery_duration_seconds: Histogram,
    pub tracking_updates_total: IntCounter,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let assignments_total = IntCounterVec::new(
            Opts::new("assignments_total", "Total assignment attempts by outcome"),
            &["outcome"],
        )
        .expect("valid assignments_total metric");

        let pending_orders = IntGauge::new("pending_orders", "Orders waiting for a rider")
            .expect("valid pending_orders metric");

        let active_deliveries =
            IntGauge::new("active_deliveries", "Deliveries currently in flight")
                .expect("valid active_deliveries metric");

        let delivery_duration_seconds = Histogram::with_opts(HistogramOpts::new(
            "delivery_duration_seconds",
            "Time from pickup to confirmed delivery in seconds",
        ))
        .expect("valid delivery_duration_seconds metric");

        let tracking_updates_total = IntCounter::new(
            "tracking_updates_total",
            "Total rider location pings recorded",
        )
        .expect("valid tracking_updates_total metric");

        registry
            .register(Box::new(assignments_total.clone()))
            .expect("register assignments_total");
        registry
            .register(Box::new(pending_orders.clone()))
            .expect("register pending_orders");
        registry
            .register(Box::new(active_deliveries.clone()))
            .expect("register active_deliveries");
        registry
            .register(Box::new(delivery_duration_seconds.clone()))
            .expect("register delivery_duration_seconds");
        registry
            .register(Box::new(tracking_updates_total.clone()))
            .expect("register tracking_updates_total");

        Self {
            registry,
            assignments_total,
            pending_orders,
            active_deliveries,
            delivery_duration_seconds,
            tracking_updates_total,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}
