//! # Notification Service 設定
//!
//! 環境変数から通知サービスの設定を読み込む。
//!
//! 読み込みは起動時に 1 度だけ行い、以降は不変の値として扱う。
//! テストでは [`ServiceConfig::from_lookup`] に任意のキー参照関数を渡す。

use std::{env, str::FromStr, time::Duration};

use thiserror::Error;
use tomo_domain::notification::MailProvider;
use tomo_infra::SmtpSettings;

/// 設定読み込みエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// 数値として解釈できない値
    #[error("{key} は数値である必要があります: {value:?}")]
    InvalidNumber { key: &'static str, value: String },
}

/// Notification Service サーバーの設定
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// バインドアドレス
    pub host:        String,
    /// ポート番号
    pub port:        u16,
    pub mail:        MailConfig,
    pub geolocation: GeoLocationConfig,
}

/// メール送信の設定
///
/// `EMAIL_PROVIDER` で希望するプロバイダを指定する:
/// - `smtp`: SMTP リレー経由（デフォルト）
/// - `resend`: Resend API 経由。`RESEND_API_KEY` がなければ SMTP にフォールバック
#[derive(Debug, Clone)]
pub struct MailConfig {
    /// 希望するプロバイダ（実際に使うのは [`MailConfig::effective_provider`]）
    pub preferred_provider: MailProvider,
    /// Resend API キー（空文字列は未設定として扱う）
    pub resend_api_key:     Option<String>,
    pub resend_base_url:    String,
    pub resend_timeout:     Duration,
    pub smtp:               SmtpSettings,
    /// 送信元メールアドレス
    pub from_address:       String,
    /// 送信元の表示名
    pub from_name:          String,
    /// メール内リンクのベース URL
    pub public_base_url:    String,
}

/// 位置推定の設定
#[derive(Debug, Clone)]
pub struct GeoLocationConfig {
    pub base_url: String,
    pub timeout:  Duration,
}

impl ServiceConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// キー参照関数から設定を読み込む
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let preferred_provider = match get("EMAIL_PROVIDER") {
            None => MailProvider::Smtp,
            Some(value) => MailProvider::from_str(value.trim()).unwrap_or_else(|_| {
                tracing::warn!(
                    email_provider = %value,
                    "未知の EMAIL_PROVIDER のため smtp を使用します"
                );
                MailProvider::Smtp
            }),
        };

        let mail = MailConfig {
            preferred_provider,
            resend_api_key: get("RESEND_API_KEY").map(|v| v.trim().to_string()),
            resend_base_url: get("RESEND_API_BASE_URL")
                .unwrap_or_else(|| "https://api.resend.com".to_string()),
            resend_timeout: Duration::from_secs(10),
            smtp: SmtpSettings {
                host:     get("SMTP_HOST").unwrap_or_else(|| "localhost".to_string()),
                port:     parse_number(&get, "SMTP_PORT", 587)?,
                secure:   get("SMTP_SECURE")
                    .is_some_and(|v| matches!(v.trim(), "true" | "1")),
                username: get("SMTP_USER"),
                password: get("SMTP_PASS"),
            },
            from_address: get("EMAIL_FROM")
                .unwrap_or_else(|| "noreply@tomoacademy.site".to_string()),
            from_name: get("EMAIL_FROM_NAME").unwrap_or_else(|| "TOMO".to_string()),
            public_base_url: get("PUBLIC_BASE_URL")
                .or_else(|| get("BETTER_AUTH_URL"))
                .unwrap_or_else(|| "http://localhost:3000".to_string()),
        };

        let geolocation = GeoLocationConfig {
            base_url: get("GEOLOCATION_BASE_URL")
                .unwrap_or_else(|| "http://ip-api.com".to_string()),
            timeout:  Duration::from_millis(parse_number(&get, "GEOLOCATION_TIMEOUT_MS", 3000)?),
        };

        Ok(Self {
            host: get("NOTIFICATION_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_number(&get, "NOTIFICATION_PORT", 13100)?,
            mail,
            geolocation,
        })
    }
}

impl MailConfig {
    /// 実際に使用するプロバイダ
    ///
    /// `resend` を希望していても API キーがなければ SMTP になる。
    pub fn effective_provider(&self) -> MailProvider {
        match (self.preferred_provider, self.resend_api_key.as_deref()) {
            (MailProvider::Resend, Some(key)) if !key.trim().is_empty() => MailProvider::Resend,
            _ => MailProvider::Smtp,
        }
    }

    /// `From` ヘッダーの値（例: `TOMO <noreply@tomoacademy.site>`）
    pub fn sender(&self) -> String {
        format!("{} <{}>", self.from_name, self.from_address)
    }
}

fn parse_number<T: std::str::FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match get(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { key, value }),
        None => Ok(default),
    }
}
