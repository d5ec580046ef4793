//! # トランスポート選択
//!
//! 起動時に設定から実際のプロバイダを決め、トランスポートを 1 つだけ構築する。
//! 送信のたびに選び直すことはなく、プロバイダ間のリトライもしない。

use std::sync::Arc;

use tomo_domain::notification::{MailProvider, NotificationError};
use tomo_infra::{MailTransport, ResendMailTransport, SmtpMailTransport};

use crate::config::MailConfig;

/// 設定からメールトランスポートを構築する
///
/// `resend` を希望していて API キーがない場合は警告を出して SMTP を使う。
pub fn build_mail_transport(
    config: &MailConfig,
) -> Result<Arc<dyn MailTransport>, NotificationError> {
    let provider = config.effective_provider();

    if provider != config.preferred_provider {
        tracing::warn!(
            preferred = %config.preferred_provider,
            effective = %provider,
            "RESEND_API_KEY が未設定のため SMTP にフォールバックします"
        );
    }

    let transport: Arc<dyn MailTransport> = match provider {
        MailProvider::Resend => Arc::new(ResendMailTransport::new(
            &config.resend_base_url,
            config.resend_api_key.clone().unwrap_or_default(),
            config.sender(),
            config.resend_timeout,
        )?),
        MailProvider::Smtp => Arc::new(SmtpMailTransport::new(&config.smtp, &config.sender())?),
    };

    tracing::info!(
        provider = %transport.provider(),
        sender = transport.sender(),
        "メールトランスポートを初期化しました"
    );

    Ok(transport)
}
