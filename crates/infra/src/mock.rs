//! # テスト用モック
//!
//! ユースケーステストで使用するインメモリのトランスポートと位置推定。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! tomo-infra = { workspace = true, features = ["test-utils"] }
//! ```

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tomo_domain::notification::{
   DeliveryReceipt,
   EmailMessage,
   GeoLocation,
   MailProvider,
   NotificationError,
};

use crate::{
   geolocation::{GeoLocationError, GeoLocator},
   notification::MailTransport,
};

// ===== MockMailTransport =====

/// 送信したメールを記録するトランスポート
///
/// `failing()` で作ると常に `SendFailed` を、`failing_with()` で作ると指定したエラーを返す。
#[derive(Clone)]
pub struct MockMailTransport {
   provider:      MailProvider,
   sender:        String,
   failure:       Option<NotificationError>,
   connection_ok: bool,
   sent:          Arc<Mutex<Vec<EmailMessage>>>,
}

impl Default for MockMailTransport {
   fn default() -> Self {
      Self::new()
   }
}

impl MockMailTransport {
   pub fn new() -> Self {
      Self {
         provider:      MailProvider::Smtp,
         sender:        "TOMO <noreply@tomoacademy.site>".to_string(),
         failure:       None,
         connection_ok: true,
         sent:          Arc::new(Mutex::new(Vec::new())),
      }
   }

   /// 常に送信失敗するモック
   pub fn failing(message: impl Into<String>) -> Self {
      Self::failing_with(NotificationError::SendFailed(message.into()))
   }

   /// 常に指定したエラーで失敗するモック
   pub fn failing_with(error: NotificationError) -> Self {
      Self {
         failure: Some(error),
         connection_ok: false,
         ..Self::new()
      }
   }

   pub fn with_provider(mut self, provider: MailProvider) -> Self {
      self.provider = provider;
      self
   }

   /// 送信されたメール（送信順）
   pub fn sent_emails(&self) -> Vec<EmailMessage> {
      self.sent.lock().unwrap().clone()
   }
}

#[async_trait]
impl MailTransport for MockMailTransport {
   async fn send_email(&self, email: &EmailMessage) -> Result<DeliveryReceipt, NotificationError> {
      if let Some(error) = &self.failure {
         return Err(error.clone());
      }

      let mut sent = self.sent.lock().unwrap();
      sent.push(email.clone());
      Ok(DeliveryReceipt {
         provider:   self.provider,
         message_id: Some(format!("mock-{}", sent.len())),
      })
   }

   async fn check_connection(&self) -> Result<(), NotificationError> {
      if self.connection_ok {
         Ok(())
      } else {
         Err(NotificationError::SendFailed("mock connection down".to_string()))
      }
   }

   fn provider(&self) -> MailProvider {
      self.provider
   }

   fn sender(&self) -> &str {
      &self.sender
   }
}

// ===== MockGeoLocator =====

/// 固定の結果を返す位置推定
///
/// 問い合わせた IP を記録する。
#[derive(Clone)]
pub struct MockGeoLocator {
   result:  Result<GeoLocation, GeoLocationError>,
   queried: Arc<Mutex<Vec<String>>>,
}

impl MockGeoLocator {
   pub fn returning(location: GeoLocation) -> Self {
      Self {
         result:  Ok(location),
         queried: Arc::new(Mutex::new(Vec::new())),
      }
   }

   pub fn failing(error: GeoLocationError) -> Self {
      Self {
         result:  Err(error),
         queried: Arc::new(Mutex::new(Vec::new())),
      }
   }

   /// 問い合わせられた IP（呼び出し順）
   pub fn queried_ips(&self) -> Vec<String> {
      self.queried.lock().unwrap().clone()
   }
}

#[async_trait]
impl GeoLocator for MockGeoLocator {
   async fn locate(&self, ip: &str) -> Result<GeoLocation, GeoLocationError> {
      self.queried.lock().unwrap().push(ip.to_string());
      self.result.clone()
   }
}
