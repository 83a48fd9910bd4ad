//! End-to-end tests: resolver to JSON response

mod common;

use std::sync::Arc;

use bridgewatch_core::registry::MemoryDeviceStore;
use bridgewatch_core::time::FixedClock;
use bridgewatch_core::traits::{DeviceInput, DeviceStore, SourceError};
use bridgewatch_core::{ApiResponse, CsvVocabulary, IngestConfig, IngestError, IngestPipeline};

use common::*;

fn pipeline<R>(resolver: R) -> IngestPipeline<R, FixedClock>
where
    R: bridgewatch_core::traits::SourceResolver,
{
    IngestPipeline::new(resolver, IngestConfig::default(), FixedClock::new(NOW))
}

#[test]
fn test_recent_window_from_fixture() {
    let pipeline = pipeline(Fixture::new("bridge_0001.csv", device_csv(&[150, 30, 90, 5])));

    let recent = pipeline.fetch_recent_query(Some("2")).unwrap();
    assert_eq!(recent.filename, "bridge_0001.csv");
    assert_eq!(recent.total_points, 4);
    assert_eq!(recent.minutes, 2.0);
    assert_eq!(recent.recent_points(), 3);
    assert_eq!(recent.last_update, Some(NOW - 5_000));
    assert_eq!(recent.vocabulary, Some(CsvVocabulary::Device));
    assert_eq!(recent.samples[0].timestamp, NOW - 5_000);
}

#[test]
fn test_query_parameter_normalization() {
    let pipeline = pipeline(Fixture::new("a.csv", device_csv(&[30, 90, 150])));

    for raw in [None, Some("abc"), Some("-5"), Some("0"), Some("")] {
        let recent = pipeline.fetch_recent_query(raw).unwrap();
        assert_eq!(recent.minutes, 1.0, "raw = {:?}", raw);
        assert_eq!(recent.recent_points(), 1);
    }

    assert_eq!(pipeline.fetch_recent_query(Some("2.9")).unwrap().minutes, 2.0);
    assert_eq!(pipeline.fetch_recent_query(Some("500")).unwrap().minutes, 10.0);
}

#[test]
fn test_every_request_refetches() {
    let fixture = Arc::new(Fixture::new("a.csv", device_csv(&[30])));
    let pipeline = pipeline(Arc::clone(&fixture));

    pipeline.fetch_recent(None).unwrap();
    pipeline.fetch_recent(None).unwrap();
    pipeline.fetch_all().unwrap();
    assert_eq!(fixture.calls(), 3);
}

#[test]
fn test_missing_source_is_reported() {
    let err = pipeline(Fixture::empty()).fetch_recent(None).unwrap_err();
    assert!(matches!(err, IngestError::SourceUnavailable));

    let err = pipeline(Fixture::new("blank.csv", "\n  \n")).fetch_recent(None).unwrap_err();
    assert!(matches!(err, IngestError::SourceUnavailable));

    let response = ApiResponse::from_result(Err(err));
    assert_eq!(response.status_code(), 404);
}

#[test]
fn test_resolver_failure_is_500() {
    let err = pipeline(Broken).fetch_recent(None).unwrap_err();
    match &err {
        IngestError::Source { resolver, source } => {
            assert_eq!(resolver, "broken");
            assert!(matches!(source, SourceError::Http { status: 503, .. }));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(ApiResponse::failure(&err).status_code(), 500);
}

#[test]
fn test_stale_file_is_empty_not_error() {
    let pipeline = pipeline(Fixture::new("old.csv", device_csv(&[3600, 7200])));
    let recent = pipeline.fetch_recent(None).unwrap();

    assert!(recent.is_stale());
    assert_eq!(recent.total_points, 2);

    let json: serde_json::Value =
        serde_json::from_str(&ApiResponse::success(recent).to_json().unwrap()).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["data"].as_array().unwrap().len(), 0);
    assert_eq!(json["metadata"]["totalPoints"], 2);
}

#[test]
fn test_unknown_header_is_empty_not_error() {
    let pipeline = pipeline(Fixture::new("odd.csv", "a,b,c\n1,2,3\n"));
    let recent = pipeline.fetch_recent(None).unwrap();
    assert_eq!(recent.total_points, 0);
    assert_eq!(recent.vocabulary, None);
}

#[test]
fn test_generic_response_shape() {
    let pipeline = pipeline(Fixture::new("feeds.csv", generic_csv(&[10])));
    let response = ApiResponse::from_result(pipeline.fetch_recent(None));

    let json: serde_json::Value = serde_json::from_str(&response.to_json().unwrap()).unwrap();
    let row = &json["data"][0];
    assert_eq!(row["timestamp"], NOW - 10_000);
    assert_eq!(row["id"], "1");
    assert_eq!(row["strain"], 115.0);
    assert!(row.get("x").is_none());
    assert_eq!(json["metadata"]["vocabulary"], "generic");
    assert_eq!(json["metadata"]["timeframe"], "1 minute");
    assert_eq!(json["metadata"]["parseStats"]["samples"], 1);
}

#[test]
fn test_config_file_drives_pipeline() {
    let config = IngestConfig::from_json_str(
        r#"{ "window": { "default_minutes": 3, "max_minutes": 5 } }"#,
    )
    .unwrap();
    let pipeline = IngestPipeline::new(
        Fixture::new("a.csv", device_csv(&[30, 150, 250, 400])),
        config,
        FixedClock::new(NOW),
    );

    assert_eq!(pipeline.fetch_recent(None).unwrap().recent_points(), 2);
    assert_eq!(pipeline.fetch_recent(Some(60.0)).unwrap().recent_points(), 3);
}

#[test]
fn test_device_registry_alongside_pipeline() {
    let store: Arc<dyn DeviceStore> = Arc::new(MemoryDeviceStore::with_clock(FixedClock::new(NOW)));
    store
        .create("ACC-01", DeviceInput::new("North span").location("Pier 2"))
        .unwrap();

    let recent = pipeline(Fixture::new("a.csv", device_csv(&[5]))).fetch_recent(None).unwrap();
    let device = recent.samples[0].device.as_deref().unwrap();
    let record = store.get(device).unwrap().unwrap();
    assert_eq!(record.name, "North span");
    assert_eq!(record.location.as_deref(), Some("Pier 2"));
}
