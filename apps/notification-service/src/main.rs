//! # Notification Service サーバー
//!
//! 認証層からの通知要求を受けてメールを送る内部サービス。
//!
//! ## 役割
//!
//! - **トランスポート選択**: 起動時に SMTP / Resend のどちらを使うか 1 度だけ決める
//! - **テンプレートレンダリング**: 通知種別ごとの件名と HTML / テキスト本文を生成する
//! - **位置推定**: ログイン通知の IP アドレスからおおよその位置を推定する
//!
//! ## 環境変数
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `NOTIFICATION_HOST` | No | バインドアドレス（デフォルト: `0.0.0.0`） |
//! | `NOTIFICATION_PORT` | No | ポート番号（デフォルト: `13100`） |
//! | `EMAIL_PROVIDER` | No | `smtp`（デフォルト）または `resend` |
//! | `RESEND_API_KEY` | No | 未設定なら `resend` 指定時も SMTP を使う |
//! | `SMTP_HOST` / `SMTP_PORT` / `SMTP_SECURE` | No | SMTP リレー |
//! | `SMTP_USER` / `SMTP_PASS` | No | SMTP 認証情報 |
//! | `EMAIL_FROM` / `EMAIL_FROM_NAME` | No | 送信元 |
//! | `PUBLIC_BASE_URL` | No | メール内リンクのベース URL（`BETTER_AUTH_URL` にフォールバック） |
//! | `LOG_FORMAT` | No | `json` または `pretty` |
//!
//! ## 起動方法
//!
//! ```bash
//! # 開発環境（Mailpit などのローカル SMTP を使う）
//! cargo run -p tomo-notification-service
//!
//! # Resend 経由
//! EMAIL_PROVIDER=resend RESEND_API_KEY=re_... cargo run -p tomo-notification-service --release
//! ```

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context as _;
use tokio::net::TcpListener;
use tomo_domain::clock::SystemClock;
use tomo_infra::IpApiGeoLocator;
use tomo_notification_service::{
    app_builder::build_app,
    config::ServiceConfig,
    transport::build_mail_transport,
    usecase::{NotificationDispatcher, TemplateRenderer},
};
use tomo_shared::observability::TracingConfig;

/// Notification Service サーバーのエントリーポイント
///
/// 以下の順序で初期化を行う:
///
/// 1. 環境変数の読み込み（.env ファイル）
/// 2. トレーシングの初期化
/// 3. 設定の読み込み
/// 4. トランスポート・位置推定・レンダラの構築
/// 5. HTTP サーバーの起動
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env ファイルを読み込む（存在する場合）
    dotenvy::dotenv().ok();

    // トレーシング初期化
    let tracing_config = TracingConfig::from_env("notification-service");
    tomo_shared::observability::init_tracing(tracing_config);
    let _tracing_guard = tracing::info_span!("app", service = "notification-service").entered();

    // 設定読み込み
    let config = ServiceConfig::from_env().context("設定の読み込みに失敗しました")?;

    tracing::info!(
        "Notification Service サーバーを起動します: {}:{}",
        config.host,
        config.port
    );

    // 依存コンポーネントを初期化
    let transport =
        build_mail_transport(&config.mail).context("メールトランスポートの初期化に失敗しました")?;
    let geolocator = Arc::new(
        IpApiGeoLocator::new(&config.geolocation.base_url, config.geolocation.timeout)
            .context("位置推定クライアントの初期化に失敗しました")?,
    );
    let renderer = TemplateRenderer::new(&config.mail.public_base_url, Arc::new(SystemClock))
        .context("テンプレートの読み込みに失敗しました")?;
    let dispatcher = Arc::new(NotificationDispatcher::new(
        transport.clone(),
        geolocator,
        renderer,
    ));

    // ルーター構築
    let app = build_app(dispatcher, transport);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("アドレスのパースに失敗しました")?;

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Notification Service サーバーが起動しました: {}", addr);

    // Graceful shutdown は axum::serve が自動的に処理する
    axum::serve(listener, app).await?;

    Ok(())
}
