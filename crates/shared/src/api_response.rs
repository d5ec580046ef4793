//! # API レスポンスエンベロープ
//!
//! 内部 API の統一レスポンス形式 `{ "data": T }` を提供する。

use serde::{Deserialize, Serialize};

/// 内部 API の統一レスポンス型
///
/// 通知サービスの成功レスポンスはすべて `{ "data": T }` 形式で返す。
/// 呼び出し元（認証層）は Deserialize で同じ型として受け取れる。
///
/// ## 使用例
///
/// ```
/// use tomo_shared::ApiResponse;
///
/// let response = ApiResponse::new(true);
/// assert!(response.data);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

impl<T> ApiResponse<T> {
    /// 新しい `ApiResponse` を作成する
    pub fn new(data: T) -> Self {
        Self { data }
    }
}
