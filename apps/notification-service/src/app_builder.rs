//! # アプリケーション構築
//!
//! State の組み立てとルーター定義を担当する。
//! `main.rs` は依存の初期化とサーバー起動に集中する。

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tomo_infra::MailTransport;
use tomo_shared::observability::{MakeRequestUuidV7, make_request_span};
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::{
    handler::{
        NotificationState,
        ReadinessState,
        health_check,
        readiness_check,
        send_notification,
        send_test_notification,
    },
    usecase::NotificationDispatcher,
};

/// ルーターを構築する
///
/// 初期化済みのディスパッチャとトランスポートを受け取り、State → Router の順に組み立てる。
pub fn build_app(
    dispatcher: Arc<NotificationDispatcher>,
    transport: Arc<dyn MailTransport>,
) -> Router {
    let readiness_state = Arc::new(ReadinessState { transport });
    let notification_state = Arc::new(NotificationState { dispatcher });

    Router::new()
        .route("/health", get(health_check))
        .merge(
            Router::new()
                .route("/health/ready", get(readiness_check))
                .with_state(readiness_state),
        )
        .route("/internal/notifications", post(send_notification))
        .route("/internal/notifications/test", post(send_test_notification))
        .with_state(notification_state)
        // Request ID レイヤー（下に書いたものが外側）
        // 1. SetRequestIdLayer（最外）: UUID v7 を生成（またはクライアント提供値を使用）
        // 2. TraceLayer: リクエストスパンに request_id を記録
        // 3. PropagateRequestIdLayer: レスポンスヘッダーに X-Request-Id をコピー
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
}
