//! # Notification Service エラー定義
//!
//! HTTP 層で発生するエラーと、RFC 9457 Problem Details への変換を定義する。
//!
//! 送信処理そのものは `bool` を返すため、ここに来るのは入力不備と
//! テスト送信の配送失敗だけ。

use axum::{
   Json,
   extract::rejection::JsonRejection,
   http::StatusCode,
   response::{IntoResponse, Response},
};
use thiserror::Error;
use tomo_domain::DomainError;
use tomo_shared::ErrorResponse;

/// Notification Service で発生するエラー
#[derive(Debug, Error)]
pub enum ServiceError {
   /// リクエストボディが解釈できない
   #[error("不正なリクエスト: {0}")]
   BadRequest(String),

   /// 入力値がドメインルールに違反している
   #[error(transparent)]
   Validation(#[from] DomainError),

   /// メール配送に失敗した
   #[error("メール配送に失敗しました: {0}")]
   DeliveryFailed(String),
}

impl From<JsonRejection> for ServiceError {
   fn from(rejection: JsonRejection) -> Self {
      ServiceError::BadRequest(rejection.body_text())
   }
}

impl IntoResponse for ServiceError {
   fn into_response(self) -> Response {
      let body = match &self {
         ServiceError::BadRequest(detail) => ErrorResponse::bad_request(detail.clone()),
         ServiceError::Validation(DomainError::Validation(detail)) => {
            ErrorResponse::validation_error(detail.clone())
         }
         ServiceError::DeliveryFailed(detail) => {
            tracing::warn!(detail = %detail, "テスト送信失敗");
            ErrorResponse::service_unavailable(detail.clone())
         }
      };

      let status =
         StatusCode::from_u16(body.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
      (status, Json(body)).into_response()
   }
}

#[cfg(test)]
mod tests {
   use pretty_assertions::assert_eq;
   use rstest::rstest;

   use super::*;

   #[rstest]
   #[case(ServiceError::BadRequest("missing field".to_string()), StatusCode::BAD_REQUEST)]
   #[case(
      ServiceError::Validation(DomainError::Validation("メールアドレスは必須です".to_string())),
      StatusCode::BAD_REQUEST
   )]
   #[case(ServiceError::DeliveryFailed("timeout".to_string()), StatusCode::SERVICE_UNAVAILABLE)]
   fn test_エラーごとのステータスコード(
      #[case] error: ServiceError,
      #[case] expected: StatusCode,
   ) {
      let response = error.into_response();

      assert_eq!(response.status(), expected);
   }

   #[tokio::test]
   async fn test_バリデーションエラーはproblem_detailsで返る() {
      let error =
         ServiceError::Validation(DomainError::Validation("メールアドレスは必須です".to_string()));

      let response = error.into_response();
      let body = axum::body::to_bytes(response.into_body(), usize::MAX)
         .await
         .unwrap();
      let json: ErrorResponse = serde_json::from_slice(&body).unwrap();

      assert_eq!(
         json,
         ErrorResponse::validation_error("メールアドレスは必須です")
      );
   }
}
