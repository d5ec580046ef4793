//! # ヘルスチェックハンドラ
//!
//! - `/health`: Liveness Check（常に `"healthy"` を返す）
//! - `/health/ready`: Readiness Check（メールトランスポートの接続状態を確認）
//!
//! レスポンス型は [`tomo_shared::HealthResponse`] / [`tomo_shared::ReadinessResponse`] を参照。

use std::{collections::HashMap, sync::Arc, time::Duration};

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use tomo_infra::MailTransport;
use tomo_shared::{CheckStatus, HealthResponse, ReadinessResponse, ReadinessStatus};

/// 接続確認のタイムアウト
const CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Notification Service のヘルスチェックエンドポイント
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::healthy(env!("CARGO_PKG_VERSION")))
}

/// Readiness Check 用の State
pub struct ReadinessState {
    pub transport: Arc<dyn MailTransport>,
}

/// Notification Service の Readiness Check エンドポイント
///
/// トランスポートの `check_connection` が成功すれば 200、失敗またはタイムアウトなら 503。
#[tracing::instrument(skip_all)]
pub async fn readiness_check(State(state): State<Arc<ReadinessState>>) -> impl IntoResponse {
    let mail_transport = check_mail_transport(state.transport.as_ref()).await;

    let mut checks = HashMap::new();
    checks.insert("mail_transport".to_string(), mail_transport);

    let response = ReadinessResponse::from_checks(checks);
    let http_status = match response.status {
        ReadinessStatus::Ready => StatusCode::OK,
        ReadinessStatus::NotReady => StatusCode::SERVICE_UNAVAILABLE,
    };

    (http_status, Json(response))
}

async fn check_mail_transport(transport: &dyn MailTransport) -> CheckStatus {
    match tokio::time::timeout(CHECK_TIMEOUT, transport.check_connection()).await {
        Ok(Ok(())) => CheckStatus::Ok,
        Ok(Err(e)) => {
            tracing::warn!(
                provider = %transport.provider(),
                error = %e,
                "readiness check: mail transport check failed"
            );
            CheckStatus::Error
        }
        Err(_) => {
            tracing::warn!(
                provider = %transport.provider(),
                "readiness check: mail transport check timed out"
            );
            CheckStatus::Error
        }
    }
}
