//! # ドメイン層エラー定義
//!
//! 呼び出し元の入力がドメインルールに違反した場合のエラー型。
//!
//! ## 設計方針
//!
//! - **送信失敗との分離**: 入力検証エラーはトランスポートを呼ぶ前に同期的に返す。
//!   送信失敗は [`NotificationError`](crate::notification::NotificationError) で表現する
//! - **thiserror 活用**: `#[error(...)]` マクロでエラーメッセージを自動生成
//! - **HTTP ステータスへのマッピング**: API 層で 400 Bad Request に変換する
//!
//! ## 使用例
//!
//! ```rust
//! use tomo_domain::DomainError;
//!
//! fn validate_address(address: &str) -> Result<(), DomainError> {
//!     if address.is_empty() {
//!         return Err(DomainError::Validation("メールアドレスは必須です".to_string()));
//!     }
//!     Ok(())
//! }
//!
//! assert!(validate_address("").is_err());
//! ```

use thiserror::Error;

/// ドメイン層で発生するエラー
#[derive(Debug, Error)]
pub enum DomainError {
    /// バリデーションエラー
    ///
    /// 入力値がドメインルールに違反している場合に使用する。
    ///
    /// # 例
    ///
    /// - 宛先メールアドレスが未入力
    /// - 文字数制限の超過
    /// - 不正なフォーマット
    #[error("バリデーションエラー: {0}")]
    Validation(String),
}
