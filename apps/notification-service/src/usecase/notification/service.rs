//! # 通知ディスパッチャ
//!
//! 位置推定 → テンプレートレンダリング → メール送信 → ログ記録を統合する。
//!
//! ## 設計方針
//!
//! - **fire-and-forget**: `send()` は送信結果を `bool` で返し、エラーやパニックを呼び出し元に伝播しない
//! - **位置推定は参考情報**: 失敗しても送信は続行し、呼び出し元の位置か `Unknown` を使う
//! - **依存性注入**: `MailTransport` と `GeoLocator` は trait で抽象化し、起動時に 1 度だけ組み立てる

use std::sync::Arc;

use tomo_domain::notification::{
    LoginDetails,
    MailProvider,
    NotificationPayload,
    NotificationRequest,
};
use tomo_infra::{
    MailTransport,
    geolocation::{GeoLocator, is_public_ip},
};
use tomo_shared::{
    event_log::{error as error_field, event},
    log_business_event,
};

use super::{TemplateRenderer, template_renderer::UNKNOWN_LOCATION};

/// 通知ディスパッチャ
///
/// 1 件の通知リクエストを 1 通のメールとして配送する。
/// 同じリクエストを 2 回渡せば 2 通送られる（重複排除は呼び出し元の責務）。
pub struct NotificationDispatcher {
    transport:  Arc<dyn MailTransport>,
    geolocator: Arc<dyn GeoLocator>,
    renderer:   TemplateRenderer,
}

impl NotificationDispatcher {
    pub fn new(
        transport: Arc<dyn MailTransport>,
        geolocator: Arc<dyn GeoLocator>,
        renderer: TemplateRenderer,
    ) -> Self {
        Self {
            transport,
            geolocator,
            renderer,
        }
    }

    /// 使用中のプロバイダ
    pub fn provider(&self) -> MailProvider {
        self.transport.provider()
    }

    /// 送信元（`From` ヘッダーの値）
    pub fn sender(&self) -> &str {
        self.transport.sender()
    }

    /// 通知を送信する（fire-and-forget）
    ///
    /// トランスポートが成功を返した場合のみ `true`。
    /// レンダリング失敗、送信失敗、プロバイダのエラー応答はいずれも `false` とし、
    /// 詳細は構造化ログに出力する。
    pub async fn send(&self, request: NotificationRequest) -> bool {
        let kind: &str = request.kind().into();
        let provider = self.transport.provider();
        let recipient = request.recipient_email().to_string();

        let location = match &request.payload {
            NotificationPayload::LoginAlert(details) => Some(self.resolve_location(details).await),
            _ => None,
        };

        // テンプレートレンダリング
        let email = match self.renderer.render(&request, location.as_deref()) {
            Ok(email) => email,
            Err(e) => {
                log_business_event!(
                    event.category = event::category::NOTIFICATION,
                    event.action = event::action::NOTIFICATION_FAILED,
                    event.result = event::result::FAILURE,
                    error.category = error_field::category::INTERNAL,
                    error.kind = error_field::kind::TEMPLATE,
                    notification.kind = kind,
                    notification.provider = %provider,
                    notification.recipient = %recipient,
                    error = %e,
                    "通知テンプレートのレンダリングに失敗"
                );
                return false;
            }
        };

        // メール送信
        match self.transport.send_email(&email).await {
            Ok(receipt) => {
                log_business_event!(
                    event.category = event::category::NOTIFICATION,
                    event.action = event::action::NOTIFICATION_SENT,
                    event.result = event::result::SUCCESS,
                    notification.kind = kind,
                    notification.provider = %receipt.provider,
                    notification.recipient = %recipient,
                    notification.message_id = receipt.message_id.as_deref().unwrap_or("-"),
                    "通知メール送信成功"
                );
                true
            }
            Err(e) => {
                log_business_event!(
                    event.category = event::category::NOTIFICATION,
                    event.action = event::action::NOTIFICATION_FAILED,
                    event.result = event::result::FAILURE,
                    error.category = error_field::category::EXTERNAL_SERVICE,
                    error.kind = error_field::kind::MAIL_DELIVERY,
                    notification.kind = kind,
                    notification.provider = %provider,
                    notification.recipient = %recipient,
                    error = %e,
                    "通知メール送信失敗"
                );
                false
            }
        }
    }

    /// ログイン通知に表示する位置を決める
    ///
    /// 公開 IP なら 1 回だけ位置推定を試みる。得られなければ呼び出し元の位置、
    /// それもなければ `Unknown`。
    async fn resolve_location(&self, details: &LoginDetails) -> String {
        let fallback = || {
            details
                .location
                .as_deref()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .unwrap_or(UNKNOWN_LOCATION)
                .to_string()
        };

        let Some(ip) = details.ip_address.as_deref().filter(|ip| is_public_ip(ip)) else {
            return fallback();
        };

        match self.geolocator.locate(ip).await {
            Ok(location) => location.label().unwrap_or_else(fallback),
            Err(e) => {
                tracing::warn!(
                    error.category = error_field::category::EXTERNAL_SERVICE,
                    error.kind = error_field::kind::GEOLOCATION,
                    ip_address = ip,
                    error = %e,
                    "IP アドレスからの位置推定に失敗"
                );
                fallback()
            }
        }
    }
}
