use autometrics::prometheus_exporter::{self, PrometheusResponse};
use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, register_histogram, Histogram, IntCounter, IntGaugeVec, Opts, Registry,
};
use tokio::sync::watch;
use warp::{Filter, Rejection, Reply};

lazy_static! {
    /// Highest offset consumed so far, per partition
    pub static ref PARTITION_OFFSET: IntGaugeVec = IntGaugeVec::new(
        Opts::new("partition_offset", "Current consumed offset per partition"),
        &["partition"]
    )
    .expect("metric can not be created");

    /// Latest known log head, per partition
    pub static ref PARTITION_LOG_SIZE: IntGaugeVec = IntGaugeVec::new(
        Opts::new("partition_log_size", "Latest known log size per partition"),
        &["partition"]
    )
    .expect("metric can not be created");

    /// log_size - current offset, per partition
    pub static ref PARTITION_LAG: IntGaugeVec = IntGaugeVec::new(
        Opts::new("partition_lag", "Consumer lag per partition"),
        &["partition"]
    )
    .expect("metric can not be created");

    pub static ref MESSAGES_PUBLISHED: IntCounter = IntCounter::new(
        "messages_published",
        "Persist notification messages published to the log"
    )
    .expect("metric can not be created");

    /// Events dropped at flush time because their routing key failed to
    /// parse or no partition owns the metric
    pub static ref ROUTING_DROPPED: IntCounter = IntCounter::new(
        "routing_dropped",
        "Events dropped due to unresolvable partition routing"
    )
    .expect("metric can not be created");

    pub static ref PUBLISH_RETRIES: IntCounter = IntCounter::new(
        "publish_retries",
        "Failed publish attempts that will be retried"
    )
    .expect("metric can not be created");

    pub static ref MESSAGE_SIZE_IN_BYTES_METRIC: Histogram = register_histogram!(
        "message_size",
        "Serialized persist message size in bytes",
        exponential_buckets(10.0, 5.0, 10).unwrap()
    )
    .expect("metric can not be created");

    pub static ref REGISTRY: Registry = Registry::new();
}

fn register_custom_metrics() {
    REGISTRY
        .register(Box::new(PARTITION_OFFSET.clone()))
        .expect("collector can be registered");
    REGISTRY
        .register(Box::new(PARTITION_LOG_SIZE.clone()))
        .expect("collector can be registered");
    REGISTRY
        .register(Box::new(PARTITION_LAG.clone()))
        .expect("collector can be registered");
    REGISTRY
        .register(Box::new(MESSAGES_PUBLISHED.clone()))
        .expect("collector can be registered");
    REGISTRY
        .register(Box::new(ROUTING_DROPPED.clone()))
        .expect("collector can be registered");
    REGISTRY
        .register(Box::new(PUBLISH_RETRIES.clone()))
        .expect("collector can be registered");
    REGISTRY
        .register(Box::new(MESSAGE_SIZE_IN_BYTES_METRIC.clone()))
        .expect("collector can be registered");
}

pub async fn start_server(port: u16, mut shutdown_signal: watch::Receiver<()>) {
    register_custom_metrics();

    let metrics_route = warp::path!("metrics").and_then(metrics_handler);

    let (_, server) =
        warp::serve(metrics_route).bind_with_graceful_shutdown(([0, 0, 0, 0], port), async move {
            let _ = shutdown_signal.changed().await;
        });
    server.await;
}

async fn metrics_handler() -> Result<impl Reply, Rejection> {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
        eprintln!("could not encode custom metrics: {}", e);
    };
    let mut res = match String::from_utf8(buffer.clone()) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("custom metrics could not be from_utf8'd: {}", e);
            String::default()
        }
    };
    buffer.clear();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
        eprintln!("could not encode prometheus metrics: {}", e);
    };
    let res_custom = match String::from_utf8(buffer.clone()) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("prometheus metrics could not be from_utf8'd: {}", e);
            String::default()
        }
    };
    buffer.clear();

    let autometrics_metrics = get_metrics_body();
    res.push_str(&res_custom);
    res.push_str(&autometrics_metrics);
    Ok(res)
}

/// Export metrics for Prometheus to scrape
pub fn get_metrics_body() -> String {
    let autometrics_response = prometheus_exporter::encode_http_response();
    autometrics_response.into_body()
}
/// Export metrics for Prometheus to scrape
pub fn get_metrics() -> PrometheusResponse {
    prometheus_exporter::encode_http_response()
}
