//! # 通知ユースケース
//!
//! 通知リクエストを 1 通のメールに変換して配送する。
//!
//! - `link`: 操作リンクの組み立て
//! - `plain_text`: HTML からのプレーンテキスト生成
//! - `template_renderer`: 種別ごとの件名と本文のレンダリング
//! - `service`: 位置推定と配送をまとめるディスパッチャ

pub mod link;
pub mod plain_text;
pub mod service;
pub mod template_renderer;

pub use service::NotificationDispatcher;
pub use template_renderer::TemplateRenderer;
