//! # 通知ハンドラ
//!
//! 認証層から呼ばれる通知送信エンドポイントを提供する。
//!
//! ## エンドポイント
//!
//! - `POST /internal/notifications` - 通知メール送信
//! - `POST /internal/notifications/test` - 接続確認用のテスト送信
//!
//! 送信の成否は `sent` で返す。配送失敗でも 200 とし、扱いは呼び出し元が決める。

use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tomo_domain::{
    notification::{MailProvider, NotificationPayload, NotificationRequest},
    recipient::{Email, Recipient},
};
use tomo_shared::ApiResponse;

use crate::{error::ServiceError, usecase::NotificationDispatcher};

/// テスト送信で使う確認リンク
const TEST_VERIFY_LINK: &str = "https://chat.tomoacademy.site/verify?token=test-token-123";

/// テスト送信の宛名
const TEST_RECIPIENT_NAME: &str = "Test User";

/// 通知ハンドラの共有状態
pub struct NotificationState {
    pub dispatcher: Arc<NotificationDispatcher>,
}

// --- リクエスト/レスポンス型 ---

/// 通知送信レスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct SendNotificationResponse {
    pub sent: bool,
}

/// テスト送信リクエスト
#[derive(Debug, Deserialize)]
pub struct TestNotificationRequest {
    pub email: String,
}

/// テスト送信レスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct TestNotificationResponse {
    pub sent:     bool,
    pub provider: MailProvider,
    pub from:     String,
    pub to:       String,
}

// --- ハンドラ ---

/// POST /internal/notifications
///
/// 通知リクエストを 1 通のメールとして送信する。
/// JSON が不正、または宛先が不正なら 400。
pub async fn send_notification(
    State(state): State<Arc<NotificationState>>,
    payload: Result<Json<NotificationRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ServiceError> {
    let Json(request) = payload?;

    let sent = state.dispatcher.send(request).await;

    Ok(Json(ApiResponse::new(SendNotificationResponse { sent })))
}

/// POST /internal/notifications/test
///
/// 固定の確認リンクでメールアドレス確認メールを送る。
/// 配送に失敗したら 503。
pub async fn send_test_notification(
    State(state): State<Arc<NotificationState>>,
    payload: Result<Json<TestNotificationRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ServiceError> {
    let Json(req) = payload?;
    let email = Email::new(req.email)?;

    let request = NotificationRequest::new(
        Recipient::new(email.clone()).with_name(TEST_RECIPIENT_NAME),
        NotificationPayload::VerifyEmail {
            link_or_token: TEST_VERIFY_LINK.to_string(),
        },
    );

    if !state.dispatcher.send(request).await {
        return Err(ServiceError::DeliveryFailed(format!(
            "{email} へのテストメール送信に失敗しました"
        )));
    }

    Ok(Json(ApiResponse::new(TestNotificationResponse {
        sent:     true,
        provider: state.dispatcher.provider(),
        from:     state.dispatcher.sender().to_string(),
        to:       email.to_string(),
    })))
}
