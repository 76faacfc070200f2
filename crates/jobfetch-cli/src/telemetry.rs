//! # Telemetry Features
//!
//! Console logging through `tracing_subscriber::fmt` is always on and is
//! filtered with `RUST_LOG` (default `info`). OpenTelemetry export is
//! optional.
//!
//! ## Feature matrix
//!
//! - `otel`: Exports `tracing` spans through OpenTelemetry.
//! - `metrics`: Records run counters and durations through OpenTelemetry.
//! - `stdout`: Enables the stdout OpenTelemetry exporter.
//!
//! ## Feature constraints
//!
//! - `stdout` requires at least one of `otel` or `metrics`.
//!
//! ## Example usage
//!
//! ```bash
//! cargo run --features otel,metrics,stdout -- fetch --num-requests 100
//! ```

// Disallow using `stdout` without `otel` or `metrics`
#[cfg(all(feature = "stdout", not(any(feature = "otel", feature = "metrics"))))]
compile_error!("The 'stdout' feature requires at least one of 'otel' or 'metrics' to be enabled.");

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[cfg(feature = "metrics")]
use jobfetch::RunStats;
#[cfg(feature = "metrics")]
use opentelemetry::metrics::{Counter, Histogram, Meter};
#[cfg(feature = "metrics")]
use opentelemetry_sdk::metrics as sdkmetrics;
#[cfg(feature = "metrics")]
use std::sync::OnceLock;

#[cfg(any(feature = "metrics", feature = "otel"))]
use opentelemetry::{InstrumentationScope, KeyValue};
#[cfg(any(feature = "metrics", feature = "otel"))]
use opentelemetry_sdk::Resource;
#[cfg(any(feature = "metrics", feature = "otel"))]
use opentelemetry_semantic_conventions as semvcns;

#[cfg(feature = "otel")]
use opentelemetry::trace::TracerProvider;
#[cfg(feature = "otel")]
use opentelemetry_sdk::propagation::TraceContextPropagator;
#[cfg(feature = "otel")]
use opentelemetry_sdk::trace as sdktrace;

const SERVICE_NAME: &str = "jobfetch";

pub struct TelemetryProviders {
    #[cfg(feature = "otel")]
    pub tracer_provider: sdktrace::SdkTracerProvider,
    #[cfg(feature = "metrics")]
    pub meter_provider: sdkmetrics::SdkMeterProvider,
}

pub fn init_telemetry() -> anyhow::Result<TelemetryProviders> {
    #[cfg(feature = "otel")]
    opentelemetry::global::set_text_map_propagator(TraceContextPropagator::new());

    #[cfg(feature = "otel")]
    let tracer_provider = init_tracer();

    #[cfg(feature = "metrics")]
    let meter_provider = init_metrics();

    #[cfg(any(feature = "metrics", feature = "otel"))]
    let scope = InstrumentationScope::builder(SERVICE_NAME)
        .with_version(env!("CARGO_PKG_VERSION"))
        .with_schema_url(semvcns::SCHEMA_URL)
        .build();

    let registry = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_thread_ids(true)
                .with_line_number(true)
                .with_target(false)
                .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
                .with_file(true),
        );

    #[cfg(feature = "otel")]
    let registry = {
        opentelemetry::global::set_tracer_provider(tracer_provider.clone());
        registry.with(
            tracing_opentelemetry::layer()
                .with_tracer(tracer_provider.tracer_with_scope(scope.clone()))
                .with_error_records_to_exceptions(true),
        )
    };

    #[cfg(feature = "metrics")]
    let registry = {
        opentelemetry::global::set_meter_provider(meter_provider.clone());
        let meter = opentelemetry::global::meter_with_scope(scope);
        init_metric_handles(meter);

        registry.with(tracing_opentelemetry::MetricsLayer::new(
            meter_provider.clone(),
        ))
    };

    registry.try_init()?;

    Ok(TelemetryProviders {
        #[cfg(feature = "otel")]
        tracer_provider,
        #[cfg(feature = "metrics")]
        meter_provider,
    })
}

/// Flushes and shuts down any OpenTelemetry providers.
pub fn shutdown_telemetry(_providers: TelemetryProviders) {
    #[cfg(feature = "otel")]
    {
        if let Err(err) = _providers.tracer_provider.force_flush() {
            eprintln!("Error flushing traces: {err:#?}");
        }
        if let Err(err) = _providers.tracer_provider.shutdown() {
            eprintln!("Error shutting down tracer: {err:#?}");
        }
    }

    #[cfg(feature = "metrics")]
    {
        if let Err(err) = _providers.meter_provider.force_flush() {
            eprintln!("Error flushing metrics: {err:#?}");
        }
        if let Err(err) = _providers.meter_provider.shutdown() {
            eprintln!("Error shutting down meter: {err:#?}");
        }
    }
}

#[cfg(any(feature = "metrics", feature = "otel"))]
fn resource() -> Resource {
    Resource::builder()
        .with_service_name(SERVICE_NAME)
        .with_schema_url(
            [KeyValue::new(
                semvcns::resource::SERVICE_VERSION,
                env!("CARGO_PKG_VERSION"),
            )],
            semvcns::SCHEMA_URL,
        )
        .build()
}

#[cfg(feature = "metrics")]
fn init_metrics() -> sdkmetrics::SdkMeterProvider {
    let builder = sdkmetrics::SdkMeterProvider::builder().with_resource(resource());

    #[cfg(feature = "stdout")]
    let builder = {
        use opentelemetry_stdout::MetricExporter;
        let exporter = MetricExporter::default();
        let reader = opentelemetry_sdk::metrics::PeriodicReader::builder(exporter)
            .with_interval(std::time::Duration::from_secs(5))
            .build();

        builder.with_reader(reader)
    };

    builder.build()
}

#[cfg(feature = "otel")]
fn init_tracer() -> sdktrace::SdkTracerProvider {
    let builder = sdktrace::SdkTracerProvider::builder().with_resource(resource());

    #[cfg(feature = "stdout")]
    let builder = {
        use opentelemetry_stdout::SpanExporter;
        let exporter = SpanExporter::default();
        let batch = sdktrace::BatchSpanProcessor::builder(exporter)
            .with_batch_config(
                sdktrace::BatchConfigBuilder::default()
                    .with_scheduled_delay(std::time::Duration::from_secs(5))
                    .with_max_queue_size(2048)
                    .build(),
            )
            .build();
        builder.with_span_processor(batch)
    };

    builder.build()
}

// Metric handles - only compiled when metrics feature is enabled
#[cfg(feature = "metrics")]
static RUNS: OnceLock<Counter<u64>> = OnceLock::new();
#[cfg(feature = "metrics")]
static REQUESTS: OnceLock<Counter<u64>> = OnceLock::new();
#[cfg(feature = "metrics")]
static IDS_HARVESTED: OnceLock<Counter<u64>> = OnceLock::new();
#[cfg(feature = "metrics")]
static MISSES: OnceLock<Counter<u64>> = OnceLock::new();
#[cfg(feature = "metrics")]
static REQUEST_FAILURES: OnceLock<Counter<u64>> = OnceLock::new();
#[cfg(feature = "metrics")]
static RUN_DURATION_MS: OnceLock<Histogram<f64>> = OnceLock::new();

#[cfg(feature = "metrics")]
fn init_metric_handles(meter: Meter) {
    let _ = RUNS.set(
        meter
            .u64_counter("runs")
            .with_description("Completed dispatcher runs")
            .build(),
    );

    let _ = REQUESTS.set(
        meter
            .u64_counter("requests")
            .with_description("Job indices dispatched")
            .build(),
    );

    let _ = IDS_HARVESTED.set(
        meter
            .u64_counter("ids_harvested")
            .with_description("Identifiers collected into result sets")
            .build(),
    );

    let _ = MISSES.set(
        meter
            .u64_counter("misses")
            .with_description("Responses without a usable identifier")
            .build(),
    );

    let _ = REQUEST_FAILURES.set(
        meter
            .u64_counter("request_failures")
            .with_description("Failed or cancelled job requests")
            .build(),
    );

    let _ = RUN_DURATION_MS.set(
        meter
            .f64_histogram("run_duration")
            .with_unit("ms")
            .with_description("End-to-end run duration")
            .build(),
    );
}

// Compiles to a no-op when metrics are disabled
#[cfg(feature = "metrics")]
pub fn record_run(stats: &RunStats, elapsed: core::time::Duration) {
    let add = |handle: &OnceLock<Counter<u64>>, value: usize| {
        if let Some(counter) = handle.get() {
            counter.add(value as u64, &[]);
        }
    };

    add(&RUNS, 1);
    add(&REQUESTS, stats.requested);
    add(&IDS_HARVESTED, stats.harvested);
    add(&MISSES, stats.misses);
    add(&REQUEST_FAILURES, stats.failures + stats.cancelled);

    if let Some(histogram) = RUN_DURATION_MS.get() {
        histogram.record(elapsed.as_secs_f64() * 1000.0, &[]);
    }
}

#[cfg(not(feature = "metrics"))]
pub fn record_run(_stats: &jobfetch::RunStats, _elapsed: core::time::Duration) {}
