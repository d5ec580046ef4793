//! # メール送信
//!
//! メール通知の配送を担当するインフラストラクチャモジュール。
//!
//! ## 設計方針
//!
//! - **trait による抽象化**: `MailTransport` trait で配送手段を抽象化
//! - **2 つの実装**: SMTP（Mailpit 開発用 / 一般的なリレー）、Resend（ホスト型 API）
//! - **起動時に選択**: どちらを使うかはサービスの設定で決め、以降は差し替えない

mod resend;
mod smtp;

use async_trait::async_trait;
pub use resend::ResendMailTransport;
pub use smtp::{SmtpMailTransport, SmtpSettings};
use tomo_domain::notification::{DeliveryReceipt, EmailMessage, MailProvider, NotificationError};

/// メール配送トレイト
///
/// 通知基盤の中核。描画済みの [`EmailMessage`] を 1 通配送する。
/// 実装は起動時に 1 度だけ生成され、`Arc` で並行リクエスト間に共有される。
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// メールを 1 通送信する
    ///
    /// リトライはしない。失敗はそのまま呼び出し元に返す。
    async fn send_email(&self, email: &EmailMessage)
    -> Result<DeliveryReceipt, NotificationError>;

    /// 配送先に到達できるか確認する（Readiness Check 用）
    async fn check_connection(&self) -> Result<(), NotificationError>;

    /// この実装のプロバイダ
    fn provider(&self) -> MailProvider;

    /// 送信元（`From` ヘッダーの値）
    fn sender(&self) -> &str;
}
