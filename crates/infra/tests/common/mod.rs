//! テスト共通ヘルパー
//!
//! 外部 API の代わりに axum のスタブサーバーをエフェメラルポートで起動する。

// 各テストファイルが独立したクレートとしてコンパイルされるため、
// 使用しない関数に dead_code 警告が出る。モジュール全体で抑制する。
#![allow(dead_code)]

use axum::Router;
use tokio::net::TcpListener;

/// スタブサーバーを起動し、ベース URL（`http://127.0.0.1:<port>`）を返す
pub async fn spawn_stub(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    format!("http://{addr}")
}
