//! # HTTP リクエストハンドラ
//!
//! axum のルートに対応するハンドラ関数を定義する。
//!
//! ## 設計方針
//!
//! - 各ハンドラはサブモジュールに配置
//! - 親モジュールで re-export し、フラットな API を提供
//! - ハンドラは薄く保ち、送信ロジックは usecase 層に委譲
//!
//! ## ハンドラ一覧
//!
//! - `health`: ヘルスチェック
//! - `notification`: 通知送信（認証層から呼ばれる内部 API）

pub mod health;
pub mod notification;

pub use health::{ReadinessState, health_check, readiness_check};
pub use notification::{NotificationState, send_notification, send_test_notification};
