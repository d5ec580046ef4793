//! # ユースケース層
//!
//! 通知サービスのビジネスロジックを実装する。
//!
//! ## 設計方針
//!
//! - **依存性注入**: トランスポートと位置推定を `Arc<dyn Trait>` で外部から注入
//! - **薄いハンドラ**: ハンドラは薄く保ち、ロジックはユースケースに集約
//!
//! ## モジュール構成
//!
//! - `notification`: 通知メールのレンダリングと配送

pub mod notification;

pub use notification::{NotificationDispatcher, TemplateRenderer};
