//! # TOMO ドメイン層
//!
//! トランザクションメール通知の中核となるドメインモデルを定義する。
//!
//! ## 設計方針
//!
//! - **値オブジェクト**: 宛先メールアドレスは [`recipient::Email`] で検証済みの値として扱う
//! - **通知イベント**: 通知種別ごとのペイロードを enum で表現する
//! - **ドメインエラー**: 入力検証の失敗と送信失敗を型で区別する
//!
//! ## 依存関係の方向
//!
//! ```text
//! notification-service → infra → domain
//!          ↘                       ↑
//!            shared ───────────────┘（依存しない）
//! ```
//!
//! ドメイン層は SMTP・HTTP クライアントなどのインフラには一切依存しない。
//!
//! ## モジュール構成
//!
//! - [`clock`] - 時刻プロバイダ
//! - [`error`] - ドメイン層で発生するエラーの定義
//! - [`notification`] - 通知リクエスト、メールメッセージ、送信エラー
//! - [`recipient`] - 宛先（メールアドレス、表示名、アバター）
//!
//! ## 使用例
//!
//! ```rust
//! use tomo_domain::{
//!     notification::{NotificationKind, NotificationPayload, NotificationRequest},
//!     recipient::{Email, Recipient},
//! };
//!
//! # fn main() -> Result<(), tomo_domain::DomainError> {
//! let request = NotificationRequest::new(
//!     Recipient::new(Email::new("user@example.com")?),
//!     NotificationPayload::ResetPassword {
//!         link_or_token: "abc123".to_string(),
//!     },
//! );
//! assert_eq!(request.kind(), NotificationKind::ResetPassword);
//! # Ok(())
//! # }
//! ```

pub mod clock;
pub mod error;
pub mod notification;
pub mod recipient;

pub use error::DomainError;
