//! # IP ジオロケーション
//!
//! ログイン通知に載せる「どこからのログインか」を推定する。
//! 推定は参考情報であり、失敗しても通知の送信は止めない。
//!
//! ## エンドポイント
//!
//! - `GET {base_url}/json/{ip}?fields=status,message,country,regionName,city`（ip-api.com）

use std::{
    net::{IpAddr, Ipv4Addr, Ipv6Addr},
    time::Duration,
};

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tomo_domain::notification::GeoLocation;

/// 位置推定エラー
#[derive(Debug, Clone, Error)]
pub enum GeoLocationError {
    /// タイムアウト
    #[error("位置推定がタイムアウトしました")]
    Timeout,

    /// ネットワークエラー
    #[error("ネットワークエラー: {0}")]
    Network(String),

    /// 2xx 以外のステータス
    #[error("予期しないステータス: {0}")]
    UnexpectedStatus(u16),

    /// サービスが `status = fail` を返した
    #[error("位置を特定できませんでした: {0}")]
    LookupFailed(String),

    /// レスポンスの解析に失敗
    #[error("レスポンスの解析に失敗: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for GeoLocationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GeoLocationError::Timeout
        } else if err.is_decode() {
            GeoLocationError::Decode(err.to_string())
        } else {
            GeoLocationError::Network(err.to_string())
        }
    }
}

/// 位置推定トレイト
#[async_trait]
pub trait GeoLocator: Send + Sync {
    /// IP アドレスから位置を推定する（1 回だけ呼び出し、リトライしない）
    async fn locate(&self, ip: &str) -> Result<GeoLocation, GeoLocationError>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IpApiResponse {
    status:      String,
    #[serde(default)]
    message:     Option<String>,
    #[serde(default)]
    country:     Option<String>,
    #[serde(default)]
    region_name: Option<String>,
    #[serde(default)]
    city:        Option<String>,
}

/// ip-api.com クライアント
pub struct IpApiGeoLocator {
    base_url: String,
    client:   reqwest::Client,
}

impl IpApiGeoLocator {
    /// 新しいクライアントを作成する
    ///
    /// `timeout` はクライアント全体に設定し、1 回の呼び出しで待つ上限になる。
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, GeoLocationError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GeoLocationError::Network(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl GeoLocator for IpApiGeoLocator {
    async fn locate(&self, ip: &str) -> Result<GeoLocation, GeoLocationError> {
        let url = format!("{}/json/{}", self.base_url, ip.trim());
        tracing::debug!(ip_address = ip, "位置推定を問い合わせます");

        let response = self
            .client
            .get(&url)
            .query(&[("fields", "status,message,country,regionName,city")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeoLocationError::UnexpectedStatus(status.as_u16()));
        }

        let body = response.json::<IpApiResponse>().await?;
        if body.status != "success" {
            return Err(GeoLocationError::LookupFailed(
                body.message.unwrap_or(body.status),
            ));
        }

        Ok(GeoLocation {
            city:    body.city,
            region:  body.region_name,
            country: body.country,
        })
    }
}

/// 位置推定を試みる価値のある IP アドレスか判定する
///
/// 以下は外部サービスに問い合わせても意味がないため `false`:
///
/// - 解釈できない文字列、`"Unknown"`、`"localhost"`
/// - ループバック、プライベート、リンクローカル、未指定アドレス
/// - IPv6 のユニークローカル（`fc00::/7`）
pub fn is_public_ip(ip: &str) -> bool {
    let ip = ip.trim();
    if ip.is_empty() || ip.eq_ignore_ascii_case("unknown") || ip.eq_ignore_ascii_case("localhost")
    {
        return false;
    }

    match ip.parse::<IpAddr>() {
        Ok(IpAddr::V4(v4)) => is_public_v4(&v4),
        Ok(IpAddr::V6(v6)) => match v6.to_ipv4_mapped() {
            Some(v4) => is_public_v4(&v4),
            None => is_public_v6(&v6),
        },
        Err(_) => false,
    }
}

fn is_public_v4(ip: &Ipv4Addr) -> bool {
    !(ip.is_loopback()
        || ip.is_private()
        || ip.is_link_local()
        || ip.is_unspecified()
        || ip.is_broadcast())
}

fn is_public_v6(ip: &Ipv6Addr) -> bool {
    let first = ip.segments()[0];
    let unique_local = (first & 0xfe00) == 0xfc00;
    let link_local = (first & 0xffc0) == 0xfe80;

    !(ip.is_loopback() || ip.is_unspecified() || unique_local || link_local)
}
