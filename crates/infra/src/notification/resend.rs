//! Resend メール送信実装
//!
//! Resend の `POST /emails` を reqwest で呼び出す。
//!
//! ## エンドポイント
//!
//! - `POST {base_url}/emails` - `Authorization: Bearer <api_key>`
//!
//! 成功時は `{ "id": "..." }`、失敗時は `{ "name", "message", "statusCode" }` が返る。

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tomo_domain::notification::{DeliveryReceipt, EmailMessage, MailProvider, NotificationError};

use super::MailTransport;

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from:    &'a str,
    to:      [&'a str; 1],
    subject: &'a str,
    html:    &'a str,
    text:    &'a str,
}

#[derive(Debug, Deserialize)]
struct SendEmailResponse {
    id: Option<String>,
}

/// Resend のエラーオブジェクト
#[derive(Debug, Deserialize)]
struct ResendErrorBody {
    #[serde(default)]
    name:    Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Resend メール送信
pub struct ResendMailTransport {
    base_url: String,
    api_key:  String,
    from:     String,
    client:   reqwest::Client,
}

impl ResendMailTransport {
    /// 新しい Resend 送信インスタンスを作成する
    ///
    /// # 引数
    ///
    /// - `base_url`: API のベース URL（末尾の `/` は無視する）
    /// - `api_key`: API キー
    /// - `from`: 送信元（例: `"TOMO <noreply@tomoacademy.site>"`）
    /// - `timeout`: 1 リクエストあたりのタイムアウト
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        from: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, NotificationError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                NotificationError::NotConfigured(format!("HTTP クライアントの構築に失敗: {e}"))
            })?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            from: from.into(),
            client,
        })
    }
}

#[async_trait]
impl MailTransport for ResendMailTransport {
    async fn send_email(
        &self,
        email: &EmailMessage,
    ) -> Result<DeliveryReceipt, NotificationError> {
        let url = format!("{}/emails", self.base_url);
        let request = SendEmailRequest {
            from:    &self.from,
            to:      [email.to.as_str()],
            subject: &email.subject,
            html:    &email.html_body,
            text:    &email.text_body,
        };

        tracing::debug!(to = %email.to, subject = %email.subject, "Resend API でメールを送信します");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| NotificationError::SendFailed(format!("Resend API 呼び出し失敗: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<ResendErrorBody>().await {
                Ok(ResendErrorBody {
                    name: Some(name),
                    message: Some(message),
                }) => format!("{name}: {message}"),
                Ok(ResendErrorBody {
                    message: Some(message),
                    ..
                }) => message,
                _ => format!("HTTP {status}"),
            };
            return Err(NotificationError::Provider {
                provider: MailProvider::Resend,
                message,
            });
        }

        let body = response.json::<SendEmailResponse>().await.map_err(|e| {
            NotificationError::SendFailed(format!("Resend レスポンスの解析に失敗: {e}"))
        })?;

        Ok(DeliveryReceipt {
            provider:   MailProvider::Resend,
            message_id: body.id,
        })
    }

    /// API キーが設定されていることのみ確認する（ネットワークには出ない）
    async fn check_connection(&self) -> Result<(), NotificationError> {
        if self.api_key.trim().is_empty() {
            return Err(NotificationError::NotConfigured(
                "RESEND_API_KEY が設定されていません".to_string(),
            ));
        }
        Ok(())
    }

    fn provider(&self) -> MailProvider {
        MailProvider::Resend
    }

    fn sender(&self) -> &str {
        &self.from
    }
}
