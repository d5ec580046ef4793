//! ip-api.com クライアントの統合テスト

mod common;

use std::time::Duration;

use axum::{
    Json,
    Router,
    extract::{Path, Query},
    http::StatusCode,
    routing::get,
};
use pretty_assertions::assert_eq;
use serde::Deserialize;
use serde_json::json;
use tomo_domain::notification::GeoLocation;
use tomo_infra::{GeoLocationError, GeoLocator, IpApiGeoLocator};

#[derive(Deserialize)]
struct Fields {
    fields: String,
}

async fn lookup(Path(ip): Path<String>, Query(query): Query<Fields>) -> Json<serde_json::Value> {
    assert_eq!(query.fields, "status,message,country,regionName,city");
    if ip == "203.0.113.7" {
        Json(json!({
            "status": "success",
            "country": "Japan",
            "regionName": "Tokyo",
            "city": "Shibuya"
        }))
    } else {
        Json(json!({ "status": "fail", "message": "reserved range" }))
    }
}

fn locator(base_url: &str, timeout: Duration) -> IpApiGeoLocator {
    IpApiGeoLocator::new(base_url, timeout).unwrap()
}

#[tokio::test]
async fn test_成功レスポンスから位置を組み立てる() {
    let base_url = common::spawn_stub(Router::new().route("/json/{ip}", get(lookup))).await;

    let location = locator(&base_url, Duration::from_secs(3))
        .locate("203.0.113.7")
        .await
        .unwrap();

    assert_eq!(
        location,
        GeoLocation {
            city:    Some("Shibuya".to_string()),
            region:  Some("Tokyo".to_string()),
            country: Some("Japan".to_string()),
        }
    );
    assert_eq!(location.label().as_deref(), Some("Shibuya, Tokyo, Japan"));
}

#[tokio::test]
async fn test_statusがfailならlookup_failed() {
    let base_url = common::spawn_stub(Router::new().route("/json/{ip}", get(lookup))).await;

    let result = locator(&base_url, Duration::from_secs(3))
        .locate("198.51.100.1")
        .await;

    assert!(
        matches!(result, Err(GeoLocationError::LookupFailed(ref m)) if m == "reserved range")
    );
}

#[tokio::test]
async fn test_2xx以外はunexpected_status() {
    let router = Router::new().route(
        "/json/{ip}",
        get(|| async { StatusCode::TOO_MANY_REQUESTS }),
    );
    let base_url = common::spawn_stub(router).await;

    let result = locator(&base_url, Duration::from_secs(3))
        .locate("203.0.113.7")
        .await;

    assert!(matches!(result, Err(GeoLocationError::UnexpectedStatus(429))));
}

#[tokio::test]
async fn test_応答が遅い場合はtimeout() {
    let router = Router::new().route(
        "/json/{ip}",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(2)).await;
            Json(json!({ "status": "success" }))
        }),
    );
    let base_url = common::spawn_stub(router).await;

    let result = locator(&base_url, Duration::from_millis(100))
        .locate("203.0.113.7")
        .await;

    assert!(matches!(result, Err(GeoLocationError::Timeout)));
}

#[tokio::test]
async fn test_不正なjsonはdecodeエラー() {
    let router = Router::new().route("/json/{ip}", get(|| async { "not json" }));
    let base_url = common::spawn_stub(router).await;

    let result = locator(&base_url, Duration::from_secs(3))
        .locate("203.0.113.7")
        .await;

    assert!(matches!(result, Err(GeoLocationError::Decode(_))));
}
