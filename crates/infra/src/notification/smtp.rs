//! SMTP メール送信実装
//!
//! lettre の `AsyncSmtpTransport` を使用してメールを送信する。
//! 開発環境では Mailpit（ローカル SMTP サーバー）に接続する。
//!
//! `secure = false` でもサーバーが STARTTLS を提示すれば TLS に昇格してから
//! 認証する。提示しないサーバー（Mailpit 等）にはそのまま平文で送る。

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport,
    AsyncTransport,
    Tokio1Executor,
    message::{Mailbox, Message, MultiPart, SinglePart, header::ContentType},
    transport::smtp::{
        authentication::Credentials,
        client::{Tls, TlsParameters},
    },
};
use tomo_domain::notification::{DeliveryReceipt, EmailMessage, MailProvider, NotificationError};

use super::MailTransport;

/// SMTP 接続設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpSettings {
    pub host:     String,
    pub port:     u16,
    /// `true` で暗黙的 TLS（SMTPS）。`false` は STARTTLS が提示されれば昇格する
    pub secure:   bool,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl SmtpSettings {
    /// 認証情報（ユーザー名とパスワードが両方ある場合のみ）
    fn credentials(&self) -> Option<Credentials> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) if !user.is_empty() => {
                Some(Credentials::new(user.clone(), pass.clone()))
            }
            _ => None,
        }
    }
}

/// SMTP メール送信
///
/// `lettre::AsyncSmtpTransport<Tokio1Executor>` をラップする。
pub struct SmtpMailTransport {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from:      Mailbox,
    sender:    String,
}

impl SmtpMailTransport {
    /// 新しい SMTP 送信インスタンスを作成する
    ///
    /// 接続はこの時点では行わない。
    ///
    /// # 引数
    ///
    /// - `settings`: SMTP サーバーの接続設定
    /// - `from`: 送信元（例: `"TOMO <noreply@tomoacademy.site>"`）
    ///
    /// # エラー
    ///
    /// - 送信元がメールボックスとして解釈できない場合は `InvalidAddress`
    /// - TLS 設定の構築に失敗した場合は `NotConfigured`
    pub fn new(settings: &SmtpSettings, from: &str) -> Result<Self, NotificationError> {
        let mailbox: Mailbox = from
            .parse()
            .map_err(|e| NotificationError::InvalidAddress(format!("送信元アドレス不正: {e}")))?;

        let builder = if settings.secure {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host).map_err(|e| {
                NotificationError::NotConfigured(format!("SMTP リレーの構築に失敗: {e}"))
            })?
        } else {
            let parameters = TlsParameters::new(settings.host.clone()).map_err(|e| {
                NotificationError::NotConfigured(format!("SMTP の TLS 設定に失敗: {e}"))
            })?;
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&settings.host)
                .tls(Tls::Opportunistic(parameters))
        };

        let builder = builder.port(settings.port);
        let builder = match settings.credentials() {
            Some(credentials) => builder.credentials(credentials),
            None => builder,
        };

        Ok(Self {
            transport: builder.build(),
            from:      mailbox,
            sender:    from.trim().to_string(),
        })
    }

    fn build_message(&self, email: &EmailMessage) -> Result<Message, NotificationError> {
        let to: Mailbox = email
            .to
            .parse()
            .map_err(|e| NotificationError::InvalidAddress(format!("宛先アドレス不正: {e}")))?;

        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(&email.subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(email.text_body.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(email.html_body.clone()),
                    ),
            )
            .map_err(|e| NotificationError::SendFailed(format!("メッセージ構築失敗: {e}")))
    }
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn send_email(
        &self,
        email: &EmailMessage,
    ) -> Result<DeliveryReceipt, NotificationError> {
        let message = self.build_message(email)?;

        tracing::debug!(to = %email.to, subject = %email.subject, "SMTP でメールを送信します");

        let response = self
            .transport
            .send(message)
            .await
            .map_err(|e| NotificationError::SendFailed(format!("SMTP 送信失敗: {e}")))?;

        Ok(DeliveryReceipt {
            provider:   MailProvider::Smtp,
            message_id: response.first_line().map(str::to_string),
        })
    }

    async fn check_connection(&self) -> Result<(), NotificationError> {
        match self.transport.test_connection().await {
            Ok(true) => Ok(()),
            Ok(false) => Err(NotificationError::SendFailed(
                "SMTP サーバーが応答しません".to_string(),
            )),
            Err(e) => Err(NotificationError::SendFailed(format!(
                "SMTP 接続確認に失敗: {e}"
            ))),
        }
    }

    fn provider(&self) -> MailProvider {
        MailProvider::Smtp
    }

    fn sender(&self) -> &str {
        &self.sender
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn settings() -> SmtpSettings {
        SmtpSettings {
            host:     "localhost".to_string(),
            port:     1025,
            secure:   false,
            username: None,
            password: None,
        }
    }

    fn message(to: &str) -> EmailMessage {
        EmailMessage {
            to:        to.to_string(),
            subject:   "Verify your email address".to_string(),
            html_body: "<p>hello</p>".to_string(),
            text_body: "hello".to_string(),
        }
    }

    #[test]
    fn トレイトはsendとsyncを実装している() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SmtpMailTransport>();
    }

    #[tokio::test]
    async fn test_表示名付きの送信元を受け付ける() {
        let transport =
            SmtpMailTransport::new(&settings(), "TOMO <noreply@tomoacademy.site>").unwrap();

        assert_eq!(transport.provider(), MailProvider::Smtp);
        assert_eq!(transport.sender(), "TOMO <noreply@tomoacademy.site>");
    }

    #[tokio::test]
    async fn test_不正な送信元はinvalid_addressになる() {
        let result = SmtpMailTransport::new(&settings(), "not an address");

        assert!(matches!(result, Err(NotificationError::InvalidAddress(_))));
    }

    #[tokio::test]
    async fn test_不正な宛先は送信前にinvalid_addressになる() {
        let transport = SmtpMailTransport::new(&settings(), "noreply@tomoacademy.site").unwrap();

        let result = transport.send_email(&message("broken")).await;

        assert!(matches!(result, Err(NotificationError::InvalidAddress(_))));
    }

    #[test]
    fn test_credentialsはユーザー名とパスワードが揃った場合のみ設定される() {
        let mut s = settings();
        assert!(s.credentials().is_none());

        s.username = Some("user".to_string());
        assert!(s.credentials().is_none());

        s.password = Some("pass".to_string());
        assert!(s.credentials().is_some());
    }
}
