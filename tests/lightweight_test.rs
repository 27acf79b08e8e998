use std::sync::Arc;
use std::time::{Duration, Instant};

use tokenmeter::recorder::Backend;
use tokenmeter::vars::Var;
use tokenmeter::{
    Config, DerivedMetric, DerivedMetrics, EndpointKind, LightweightBackend, MetricsRecord,
    MetricsRecorder, Result, ServiceConfig, TokenmeterError, VarRegistry, calculate,
};

// ============================================================================
// Helpers
// ============================================================================

fn int(vars: &VarRegistry, name: &str) -> i64 {
    match vars.get(name) {
        Some(Var::Int(var)) => var.value(),
        other => panic!("expected int var {name}, got {other:?}"),
    }
}

fn float(vars: &VarRegistry, name: &str) -> f64 {
    match vars.get(name) {
        Some(Var::Float(var)) => var.value(),
        other => panic!("expected float var {name}, got {other:?}"),
    }
}

fn backend() -> LightweightBackend {
    LightweightBackend::new(Arc::new(VarRegistry::new()), &ServiceConfig::default()).unwrap()
}

fn record(model: &str, endpoint: EndpointKind, status_code: u16, latency_ms: u64) -> MetricsRecord {
    let t0 = Instant::now();
    MetricsRecord {
        request_start: Some(t0),
        response_start: Some(t0 + Duration::from_millis(10)),
        first_token: Some(t0 + Duration::from_millis(10)),
        response_end: Some(t0 + Duration::from_millis(latency_ms)),
        model: model.to_string(),
        status_code,
        ..MetricsRecord::new(endpoint)
    }
}

fn record_once(backend: &LightweightBackend, record: &MetricsRecord) {
    backend.record(record, &calculate(record)).unwrap();
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn publishes_service_identity() {
    let vars = Arc::new(VarRegistry::new());
    let service = ServiceConfig {
        name: "pedro-ops".to_string(),
        version: "1.0.0".to_string(),
    };
    LightweightBackend::new(Arc::clone(&vars), &service).unwrap();

    let snapshot = vars.snapshot().unwrap();
    assert_eq!(snapshot["service"], "pedro-ops");
    assert_eq!(snapshot["version"], "1.0.0");
}

#[test]
fn same_key_twice_counts_two_and_keeps_last_latency() {
    let backend = backend();
    record_once(&backend, &record("gpt-4", EndpointKind::Completions, 200, 100));
    record_once(&backend, &record("gpt-4", EndpointKind::Completions, 200, 300));

    let vars = backend.vars();
    assert_eq!(int(vars, "requests_gpt-4_completions"), 2);
    // Last write wins: not the mean of 100 and 300.
    assert_eq!(float(vars, "avg_latency_gpt-4_completions"), 300.0);
    assert_eq!(float(vars, "avg_ttft_gpt-4_completions"), 10.0);
}

#[test]
fn all_key_vars_are_created_on_first_sight() {
    let backend = backend();
    record_once(&backend, &record("gpt-4", EndpointKind::Completions, 200, 100));

    let names = backend.vars().names();
    for expected in [
        "requests_gpt-4_completions",
        "errors_gpt-4_completions",
        "avg_latency_gpt-4_completions",
        "avg_ttft_gpt-4_completions",
    ] {
        assert!(names.iter().any(|n| n == expected), "missing {expected}");
    }
    assert_eq!(int(backend.vars(), "errors_gpt-4_completions"), 0);
}

#[test]
fn error_counter_counts_status_400_and_above() {
    let backend = backend();
    for status in [200, 399, 400, 404, 500] {
        record_once(&backend, &record("gpt-4", EndpointKind::Completions, status, 100));
    }

    assert_eq!(int(backend.vars(), "requests_gpt-4_completions"), 5);
    assert_eq!(int(backend.vars(), "errors_gpt-4_completions"), 3);
}

#[test]
fn keys_are_separated_by_model_and_endpoint() {
    let backend = backend();
    record_once(&backend, &record("gpt-4", EndpointKind::Completions, 200, 100));
    record_once(&backend, &record("gpt-4", EndpointKind::Embeddings, 200, 100));
    record_once(&backend, &record("gpt-3.5", EndpointKind::Completions, 200, 100));

    assert_eq!(int(backend.vars(), "requests_gpt-4_completions"), 1);
    assert_eq!(int(backend.vars(), "requests_gpt-4_embeddings"), 1);
    assert_eq!(int(backend.vars(), "requests_gpt-3.5_completions"), 1);
}

#[test]
fn gauges_untouched_when_derived_metric_absent() {
    let backend = backend();
    let first = record("gpt-4", EndpointKind::Completions, 200, 120);
    record_once(&backend, &first);

    let mut second = record("gpt-4", EndpointKind::Completions, 200, 999);
    second.request_start = None;
    record_once(&backend, &second);

    assert_eq!(int(backend.vars(), "requests_gpt-4_completions"), 2);
    assert_eq!(float(backend.vars(), "avg_latency_gpt-4_completions"), 120.0);
}

#[test]
fn name_collision_is_reported_not_panicked() {
    let vars = Arc::new(VarRegistry::new());
    vars.new_int("requests_gpt-4_completions").unwrap();
    let backend = LightweightBackend::new(Arc::clone(&vars), &ServiceConfig::default()).unwrap();

    let record = record("gpt-4", EndpointKind::Completions, 200, 100);
    let err = backend.record(&record, &calculate(&record)).unwrap_err();
    assert!(matches!(err, TokenmeterError::DuplicateVar(_)));
}

#[test]
fn collision_on_last_key_var_publishes_nothing() {
    let vars = Arc::new(VarRegistry::new());
    vars.new_float("avg_ttft_gpt-4_completions").unwrap();
    let backend = LightweightBackend::new(Arc::clone(&vars), &ServiceConfig::default()).unwrap();

    let record = record("gpt-4", EndpointKind::Completions, 200, 100);
    for _ in 0..2 {
        let err = backend.record(&record, &calculate(&record)).unwrap_err();
        assert!(
            matches!(&err, TokenmeterError::DuplicateVar(name) if name == "avg_ttft_gpt-4_completions"),
            "unexpected error: {err}"
        );
    }

    assert_eq!(
        vars.names(),
        vec!["avg_ttft_gpt-4_completions", "service", "version"]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_first_access_creates_once_and_loses_nothing() {
    let recorder = Arc::new(MetricsRecorder::new(&Config::default()).unwrap());

    let mut handles = Vec::new();
    for i in 0..64u64 {
        let recorder = Arc::clone(&recorder);
        handles.push(tokio::spawn(async move {
            let status = if i % 4 == 0 { 500 } else { 200 };
            let record = record("llama-3", EndpointKind::Completions, status, 100 + i);
            recorder.record(&record, &calculate(&record));
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let vars = recorder.vars().unwrap();
    assert_eq!(int(vars, "requests_llama-3_completions"), 64);
    assert_eq!(int(vars, "errors_llama-3_completions"), 16);
}

// ============================================================================
// Best-effort recording
// ============================================================================

struct FailingBackend;

impl Backend for FailingBackend {
    fn name(&self) -> &str {
        "failing"
    }

    fn record(&self, _record: &MetricsRecord, _derived: &DerivedMetrics) -> Result<()> {
        Err(TokenmeterError::Backend {
            backend: "failing".to_string(),
            message: "unavailable".to_string(),
        })
    }
}

#[test]
fn failing_backend_does_not_stop_the_others() {
    let vars = Arc::new(VarRegistry::new());
    let mut recorder = MetricsRecorder::empty();
    recorder.add_backend(Arc::new(FailingBackend));
    recorder.add_backend(Arc::new(
        LightweightBackend::new(Arc::clone(&vars), &ServiceConfig::default()).unwrap(),
    ));

    let record = record("gpt-4", EndpointKind::Completions, 200, 100);
    let mut derived = calculate(&record);
    derived.insert(DerivedMetric::ApiLatencyMs, 42.0);
    recorder.record(&record, &derived);

    assert_eq!(recorder.backend_names(), vec!["failing", "lightweight"]);
    assert_eq!(int(&vars, "requests_gpt-4_completions"), 1);
    assert_eq!(float(&vars, "avg_latency_gpt-4_completions"), 42.0);
}
