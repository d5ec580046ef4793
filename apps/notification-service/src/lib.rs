//! # Notification Service ライブラリ
//!
//! 通知ディスパッチャと HTTP ハンドラを公開する。
//! 認証層はライブラリとして [`usecase::NotificationDispatcher`] を直接使うか、
//! HTTP 経由で `/internal/notifications` を呼ぶ。

pub mod app_builder;
pub mod config;
pub mod error;
pub mod handler;
pub mod transport;
pub mod usecase;
