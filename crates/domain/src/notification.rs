//! # 通知
//!
//! トランザクションメール通知に関するドメインモデルを定義する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 備考 |
//! |---|------------|------|
//! | [`NotificationRequest`] | 通知リクエスト | 認証層のイベントごとに 1 つ生成し、1 回だけ送信する |
//! | [`NotificationKind`] | 通知種別 | 5 種類: メール確認、ウェルカム、パスワード再設定、ログイン通知、メール変更確認 |
//! | [`MailProvider`] | 送信プロバイダ | SMTP または Resend |
//! | [`GeoLocation`] | 推定位置 | ログイン通知用。永続化しない |
//!
//! ## 設計方針
//!
//! - **enum によるペイロード**: 通知種別ごとに必要な項目だけを持たせる
//! - **fire-and-forget**: 送信失敗は呼び出し元（認証層）の処理を止めない
//! - **テンプレート分離**: 通知リクエストとメール生成は分離（TemplateRenderer は notification-service）

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;
use thiserror::Error;

use crate::recipient::{Email, Recipient};

/// 通知送信エラー
#[derive(Debug, Clone, Error)]
pub enum NotificationError {
    /// メール送信に失敗（ネットワーク、タイムアウト、SMTP 応答エラーなど）
    #[error("メール送信に失敗: {0}")]
    SendFailed(String),

    /// プロバイダがエラーオブジェクトを返した
    #[error("{provider} がエラーを返しました: {message}")]
    Provider {
        provider: MailProvider,
        message:  String,
    },

    /// テンプレートレンダリングに失敗
    #[error("テンプレートレンダリングに失敗: {0}")]
    TemplateFailed(String),

    /// 送信元・宛先アドレスがトランスポートで受け付けられない
    #[error("メールアドレスが不正: {0}")]
    InvalidAddress(String),

    /// 送信に必要な設定が不足している
    #[error("送信設定が不足しています: {0}")]
    NotConfigured(String),
}

/// 送信プロバイダ
///
/// `EMAIL_PROVIDER` 環境変数の値と一致する snake_case でシリアライズされる。
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    IntoStaticStr,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MailProvider {
    /// SMTP リレー経由
    Smtp,
    /// Resend（ホスト型トランザクションメール API）経由
    Resend,
}

/// 通知種別
///
/// ログの `notification.kind` フィールドと API の `kind` タグに使われる。
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    IntoStaticStr,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NotificationKind {
    /// メールアドレス確認: サインアップ直後
    VerifyEmail,
    /// ウェルカム: メールアドレス確認完了後
    Welcome,
    /// パスワード再設定: 再設定リクエスト時
    ResetPassword,
    /// ログイン通知: 新しいログインの検知時
    LoginAlert,
    /// メールアドレス変更確認: 変更先アドレスに送信
    EmailChange,
}

/// ログイン通知の付帯情報
///
/// すべて任意項目。`location` は位置推定に失敗した場合のフォールバックとして使う。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginDetails {
    /// ログイン元 IP アドレス
    #[serde(default)]
    pub ip_address: Option<String>,
    /// ブラウザの User-Agent
    #[serde(default)]
    pub user_agent: Option<String>,
    /// 呼び出し元が把握している位置情報
    #[serde(default)]
    pub location:   Option<String>,
    /// ログイン日時（省略時は送信時刻）
    #[serde(default)]
    pub timestamp:  Option<DateTime<Utc>>,
}

/// 通知種別ごとのペイロード
///
/// `link_or_token` には完成済みの URL と生のトークンのどちらも渡せる。
/// URL の組み立ては TemplateRenderer 側で行う。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotificationPayload {
    /// メールアドレス確認
    VerifyEmail { link_or_token: String },
    /// ウェルカム
    Welcome,
    /// パスワード再設定
    ResetPassword { link_or_token: String },
    /// ログイン通知
    LoginAlert(LoginDetails),
    /// メールアドレス変更確認
    EmailChange { link_or_token: String },
}

impl NotificationPayload {
    /// 通知種別を返す
    pub fn kind(&self) -> NotificationKind {
        match self {
            Self::VerifyEmail { .. } => NotificationKind::VerifyEmail,
            Self::Welcome => NotificationKind::Welcome,
            Self::ResetPassword { .. } => NotificationKind::ResetPassword,
            Self::LoginAlert(_) => NotificationKind::LoginAlert,
            Self::EmailChange { .. } => NotificationKind::EmailChange,
        }
    }

    /// リンクまたはトークンを返す（リンクを持たない種別は `None`）
    pub fn link_or_token(&self) -> Option<&str> {
        match self {
            Self::VerifyEmail { link_or_token }
            | Self::ResetPassword { link_or_token }
            | Self::EmailChange { link_or_token } => Some(link_or_token),
            Self::Welcome | Self::LoginAlert(_) => None,
        }
    }
}

/// 通知リクエスト
///
/// 認証層のイベント（サインアップ、ログイン、パスワード再設定要求など）ごとに生成される。
/// 構築後は変更せず、ディスパッチャが 1 回だけ消費する。
/// 同じ内容を 2 回送れば 2 通のメールになる（重複排除は呼び出し元の責務）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRequest {
    /// 受信者
    pub recipient: Recipient,
    /// 通知種別ごとのペイロード
    pub payload:   NotificationPayload,
}

impl NotificationRequest {
    pub fn new(recipient: Recipient, payload: NotificationPayload) -> Self {
        Self { recipient, payload }
    }

    /// 通知種別を返す
    pub fn kind(&self) -> NotificationKind {
        self.payload.kind()
    }

    /// 受信者のメールアドレスを返す
    pub fn recipient_email(&self) -> &Email {
        &self.recipient.email
    }
}

/// メールメッセージ
///
/// テンプレートレンダリングの出力。MailTransport に渡される。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    /// 送信先メールアドレス
    pub to:        String,
    /// 件名
    pub subject:   String,
    /// HTML 本文
    pub html_body: String,
    /// プレーンテキスト本文
    pub text_body: String,
}

/// 送信成功時の受領情報
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    /// 送信に使ったプロバイダ
    pub provider:   MailProvider,
    /// プロバイダが払い出したメッセージ ID（監査ログ用）
    pub message_id: Option<String>,
}

/// IP アドレスから推定した位置
///
/// ログイン通知 1 件ごとに取得する参考情報。永続化しない。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeoLocation {
    pub city:    Option<String>,
    pub region:  Option<String>,
    pub country: Option<String>,
}

impl GeoLocation {
    /// 人が読める位置ラベルを返す（例: `Tokyo, Japan`）
    ///
    /// 空でない要素を `, ` で連結する。隣接する同名要素（都市国家など）は 1 つにまとめる。
    /// 要素がひとつもなければ `None`。
    pub fn label(&self) -> Option<String> {
        let mut parts: Vec<&str> = Vec::with_capacity(3);
        for part in [&self.city, &self.region, &self.country]
            .into_iter()
            .flatten()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
        {
            if parts.last() != Some(&part) {
                parts.push(part);
            }
        }

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn make_recipient() -> Recipient {
        Recipient::new(Email::new("a@example.com").unwrap())
    }

    #[rstest]
    #[case(NotificationKind::VerifyEmail, "verify_email")]
    #[case(NotificationKind::Welcome, "welcome")]
    #[case(NotificationKind::ResetPassword, "reset_password")]
    #[case(NotificationKind::LoginAlert, "login_alert")]
    #[case(NotificationKind::EmailChange, "email_change")]
    fn test_notification_kindの文字列変換が正しい(
        #[case] kind: NotificationKind,
        #[case] expected: &str,
    ) {
        assert_eq!(kind.to_string(), expected);
        assert_eq!(NotificationKind::from_str(expected).unwrap(), kind);
    }

    #[test]
    fn test_mail_providerの文字列変換が正しい() {
        assert_eq!(MailProvider::Smtp.to_string(), "smtp");
        assert_eq!(MailProvider::Resend.to_string(), "resend");
        assert_eq!(MailProvider::from_str("resend").unwrap(), MailProvider::Resend);
        assert!(MailProvider::from_str("sendgrid").is_err());
    }

    #[test]
    fn test_kindが各ペイロードで正しい値を返す() {
        let cases = [
            (
                NotificationPayload::VerifyEmail {
                    link_or_token: "t".to_string(),
                },
                NotificationKind::VerifyEmail,
            ),
            (NotificationPayload::Welcome, NotificationKind::Welcome),
            (
                NotificationPayload::ResetPassword {
                    link_or_token: "t".to_string(),
                },
                NotificationKind::ResetPassword,
            ),
            (
                NotificationPayload::LoginAlert(LoginDetails::default()),
                NotificationKind::LoginAlert,
            ),
            (
                NotificationPayload::EmailChange {
                    link_or_token: "t".to_string(),
                },
                NotificationKind::EmailChange,
            ),
        ];

        for (payload, expected) in cases {
            let request = NotificationRequest::new(make_recipient(), payload);
            assert_eq!(request.kind(), expected);
        }
    }

    #[test]
    fn test_link_or_tokenはリンクを持つ種別だけが返す() {
        let reset = NotificationPayload::ResetPassword {
            link_or_token: "abc123".to_string(),
        };
        assert_eq!(reset.link_or_token(), Some("abc123"));
        assert_eq!(NotificationPayload::Welcome.link_or_token(), None);
        assert_eq!(
            NotificationPayload::LoginAlert(LoginDetails::default()).link_or_token(),
            None
        );
    }

    #[test]
    fn test_リクエストはkindタグ付きjsonからデシリアライズできる() {
        let json = r#"{
            "recipient": { "email": "a@example.com", "name": "Taro" },
            "payload": { "kind": "reset_password", "link_or_token": "abc123" }
        }"#;

        let request: NotificationRequest = serde_json::from_str(json).unwrap();

        assert_eq!(request.recipient_email().as_str(), "a@example.com");
        assert_eq!(request.recipient.name.as_deref(), Some("Taro"));
        assert_eq!(
            request.payload,
            NotificationPayload::ResetPassword {
                link_or_token: "abc123".to_string(),
            }
        );
    }

    #[test]
    fn test_ログイン通知は付帯情報を省略できる() {
        let json = r#"{
            "recipient": { "email": "a@example.com" },
            "payload": { "kind": "login_alert", "ip_address": "203.0.113.7" }
        }"#;

        let request: NotificationRequest = serde_json::from_str(json).unwrap();

        let NotificationPayload::LoginAlert(details) = request.payload else {
            panic!("login_alert であること");
        };
        assert_eq!(details.ip_address.as_deref(), Some("203.0.113.7"));
        assert!(details.user_agent.is_none());
        assert!(details.timestamp.is_none());
    }

    #[test]
    fn test_宛先が不正なリクエストはデシリアライズできない() {
        let json = r#"{
            "recipient": { "email": "" },
            "payload": { "kind": "welcome" }
        }"#;

        assert!(serde_json::from_str::<NotificationRequest>(json).is_err());
    }

    #[rstest]
    #[case(Some("Tokyo"), Some("Tokyo"), Some("Japan"), Some("Tokyo, Japan"))]
    #[case(Some("Osaka"), Some("Osaka Prefecture"), Some("Japan"), Some("Osaka, Osaka Prefecture, Japan"))]
    #[case(Some("Monaco"), None, Some("Monaco"), Some("Monaco"))]
    #[case(Some("Singapore"), Some("Singapore"), Some("Singapore"), Some("Singapore"))]
    #[case(None, Some(""), Some("Japan"), Some("Japan"))]
    #[case(None, None, None, None)]
    fn test_geo_locationのラベル(
        #[case] city: Option<&str>,
        #[case] region: Option<&str>,
        #[case] country: Option<&str>,
        #[case] expected: Option<&str>,
    ) {
        let location = GeoLocation {
            city:    city.map(str::to_string),
            region:  region.map(str::to_string),
            country: country.map(str::to_string),
        };

        assert_eq!(location.label().as_deref(), expected);
    }
}
