//! # TOMO インフラ層
//!
//! 通知サービスが依存する外部システムとの通信を担当する。
//!
//! ## 責務
//!
//! - **メール送信**: SMTP リレーと Resend API の 2 種類のトランスポート
//! - **位置推定**: ログイン通知用の IP ジオロケーション（ip-api.com）
//!
//! ## 依存関係
//!
//! ```text
//! notification-service → infra → domain
//! ```
//!
//! ドメイン層はインフラ層に依存しない。トランスポートの選択はサービス側の責務。
//!
//! ## モジュール構成
//!
//! - [`notification`] - `MailTransport` トレイトと SMTP / Resend 実装
//! - [`geolocation`] - `GeoLocator` トレイトと ip-api.com 実装
//! - `mock` - テスト用のインメモリ実装（`test-utils` feature）

pub mod geolocation;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
pub mod notification;

pub use geolocation::{GeoLocationError, GeoLocator, IpApiGeoLocator};
pub use notification::{MailTransport, ResendMailTransport, SmtpMailTransport, SmtpSettings};
