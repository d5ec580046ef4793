//! # テンプレートレンダラー
//!
//! tera テンプレートエンジンで通知メールの件名と HTML 本文を生成し、
//! HTML からプレーンテキスト本文を導出する。
//!
//! ## 設計方針
//!
//! - **`include_str!` によるコンパイル時埋め込み**: テンプレートはバイナリに埋め込まれる
//! - **共通レイアウト**: `base.html` を各通知テンプレートが継承する
//! - **エスケープ**: ユーザー由来の値は HTML エスケープする。リンクは `url_attr`
//!   フィルタで URL に現れ得ない文字だけを符号化し、それ以外はそのまま埋め込む
//! - **時刻は Clock から取得**: 同じ入力と時刻からは同じメールが生成される

use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Datelike, Utc};
use tera::{Context, Tera, Value};
use tomo_domain::{
    clock::Clock,
    notification::{
        EmailMessage,
        NotificationError,
        NotificationKind,
        NotificationPayload,
        NotificationRequest,
    },
};

use super::{
    link::{action_path, resolve_action_link},
    plain_text::html_to_text,
};

/// ログイン日時の表示形式（例: `Thu, 02 Jan 2025 03:04:05 GMT`）
const LOGIN_TIME_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// 位置が分からないときの表示
pub const UNKNOWN_LOCATION: &str = "Unknown";

/// テンプレートレンダラー
///
/// tera テンプレートエンジンをラップし、`NotificationRequest` から
/// `EmailMessage` を生成する。
pub struct TemplateRenderer {
    engine:   Tera,
    base_url: String,
    clock:    Arc<dyn Clock>,
}

impl TemplateRenderer {
    /// 新しいレンダラーインスタンスを作成
    ///
    /// # 引数
    ///
    /// - `base_url`: メール内リンクのベース URL（例: `https://chat.tomoacademy.site`）
    /// - `clock`: ログイン日時の既定値とフッターの年に使う時刻
    pub fn new(base_url: &str, clock: Arc<dyn Clock>) -> Result<Self, NotificationError> {
        let mut engine = Tera::default();

        engine
            .add_raw_templates(vec![
                (
                    "base.html",
                    include_str!("../../../templates/notifications/base.html"),
                ),
                (
                    "verify_email.html",
                    include_str!("../../../templates/notifications/verify_email.html"),
                ),
                (
                    "welcome.html",
                    include_str!("../../../templates/notifications/welcome.html"),
                ),
                (
                    "reset_password.html",
                    include_str!("../../../templates/notifications/reset_password.html"),
                ),
                (
                    "login_alert.html",
                    include_str!("../../../templates/notifications/login_alert.html"),
                ),
                (
                    "email_change.html",
                    include_str!("../../../templates/notifications/email_change.html"),
                ),
            ])
            .map_err(|e| NotificationError::TemplateFailed(e.to_string()))?;

        engine.set_escape_fn(escape_html);
        engine.register_filter("url_attr", url_attr);

        Ok(Self {
            engine,
            base_url: base_url.trim_end_matches('/').to_string(),
            clock,
        })
    }

    /// 通知リクエストからメールメッセージを生成する
    ///
    /// `location` はログイン通知でのみ使う推定済みの位置。`None` なら `Unknown`。
    pub fn render(
        &self,
        request: &NotificationRequest,
        location: Option<&str>,
    ) -> Result<EmailMessage, NotificationError> {
        let kind = request.kind();
        let context = self.build_context(request, location);
        let template_name: &str = kind.into();

        let html_body = self
            .engine
            .render(&format!("{template_name}.html"), &context)
            .map_err(|e| NotificationError::TemplateFailed(e.to_string()))?;
        let text_body = html_to_text(&html_body);

        Ok(EmailMessage {
            to: request.recipient_email().to_string(),
            subject: subject(kind).to_string(),
            html_body,
            text_body,
        })
    }

    fn build_context(&self, request: &NotificationRequest, location: Option<&str>) -> Context {
        let now = self.clock.now();
        let recipient = &request.recipient;
        let name = recipient.display_name();
        let avatar_url = recipient
            .avatar_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty());

        let mut context = Context::new();
        context.insert("name", &name);
        context.insert("avatar_url", &avatar_url);
        context.insert("avatar_alt", name.unwrap_or("User"));
        context.insert("year", &now.year());

        if let (Some(link_or_token), Some(path)) =
            (request.payload.link_or_token(), action_path(request.kind()))
        {
            context.insert(
                "action_link",
                &resolve_action_link(&self.base_url, path, link_or_token),
            );
        }

        match &request.payload {
            NotificationPayload::Welcome => {
                context.insert("dashboard_link", &format!("{}/dashboard", self.base_url));
            }
            NotificationPayload::LoginAlert(details) => {
                let login_time: DateTime<Utc> = details.timestamp.unwrap_or(now);
                context.insert(
                    "login_time",
                    &login_time.format(LOGIN_TIME_FORMAT).to_string(),
                );
                context.insert("ip_address", &non_empty(details.ip_address.as_deref()));
                context.insert("user_agent", &non_empty(details.user_agent.as_deref()));
                context.insert("location", location.unwrap_or(UNKNOWN_LOCATION));
                context.insert("reset_link", &format!("{}/reset-password", self.base_url));
                context.insert(
                    "security_link",
                    &format!("{}/settings/security", self.base_url),
                );
            }
            NotificationPayload::VerifyEmail { .. }
            | NotificationPayload::ResetPassword { .. }
            | NotificationPayload::EmailChange { .. } => {}
        }

        context
    }
}

/// 通知種別ごとの件名
pub fn subject(kind: NotificationKind) -> &'static str {
    match kind {
        NotificationKind::VerifyEmail => "Verify your email address",
        NotificationKind::Welcome => "Welcome! Your account is ready",
        NotificationKind::ResetPassword => "Reset your password",
        NotificationKind::LoginAlert => "New login to your account",
        NotificationKind::EmailChange => "Verify your new email address",
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// HTML エスケープ
///
/// 要素と属性値の区切りになる文字だけを対象にする（`/` は符号化しない）。
fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// リンクを属性値・本文に埋め込める形にする tera フィルタ
///
/// URL に現れ得ない `"` `'` `<` `>` と空白だけをパーセントエンコードする。
/// `&` などはそのまま残すため、リンクは送られてきた文字列のまま表示される。
fn url_attr(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let link = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("url_attr には文字列を渡してください"))?;

    let mut encoded = String::with_capacity(link.len());
    for c in link.chars() {
        match c {
            '"' => encoded.push_str("%22"),
            '\'' => encoded.push_str("%27"),
            '<' => encoded.push_str("%3C"),
            '>' => encoded.push_str("%3E"),
            ' ' => encoded.push_str("%20"),
            _ => encoded.push(c),
        }
    }
    Ok(Value::String(encoded))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use tomo_domain::{
        clock::FixedClock,
        notification::LoginDetails,
        recipient::{Email, Recipient},
    };

    use super::*;

    fn make_renderer(base_url: &str) -> TemplateRenderer {
        let now = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        TemplateRenderer::new(base_url, Arc::new(FixedClock::new(now))).unwrap()
    }

    fn make_request(payload: NotificationPayload) -> NotificationRequest {
        NotificationRequest::new(
            Recipient::new(Email::new("user@example.com").unwrap()).with_name("Taro"),
            payload,
        )
    }

    #[test]
    fn newが正常に初期化される() {
        let renderer = TemplateRenderer::new("https://x.test", Arc::new(FixedClock::new(Utc::now())));
        assert!(renderer.is_ok());
    }

    #[rstest]
    #[case(NotificationPayload::VerifyEmail { link_or_token: "t".to_string() }, "Verify your email address")]
    #[case(NotificationPayload::Welcome, "Welcome! Your account is ready")]
    #[case(NotificationPayload::ResetPassword { link_or_token: "t".to_string() }, "Reset your password")]
    #[case(NotificationPayload::LoginAlert(LoginDetails::default()), "New login to your account")]
    #[case(NotificationPayload::EmailChange { link_or_token: "t".to_string() }, "Verify your new email address")]
    fn test_種別ごとの件名と宛先(#[case] payload: NotificationPayload, #[case] expected: &str) {
        let email = make_renderer("https://x.test")
            .render(&make_request(payload), None)
            .unwrap();

        assert_eq!(email.subject, expected);
        assert_eq!(email.to, "user@example.com");
        assert!(email.html_body.contains("Hi Taro,"));
        assert!(email.html_body.contains("2025 TOMO Academy"));
    }

    #[test]
    fn test_トークンからパスワード再設定リンクを組み立てる() {
        let email = make_renderer("https://x.test")
            .render(
                &make_request(NotificationPayload::ResetPassword {
                    link_or_token: "abc123".to_string(),
                }),
                None,
            )
            .unwrap();

        assert!(
            email
                .html_body
                .contains(r#"href="https://x.test/reset-password?token=abc123""#)
        );
        assert!(
            email
                .text_body
                .contains("https://x.test/reset-password?token=abc123")
        );
    }

    #[rstest]
    #[case(NotificationPayload::VerifyEmail { link_or_token: "https://auth.x.test/verify?token=a&callbackURL=%2Fhome".to_string() })]
    #[case(NotificationPayload::EmailChange { link_or_token: "https://auth.x.test/verify?token=a&callbackURL=%2Fhome".to_string() })]
    #[case(NotificationPayload::ResetPassword { link_or_token: "https://auth.x.test/verify?token=a&callbackURL=%2Fhome".to_string() })]
    fn test_絶対urlはhtmlとテキストにそのまま現れる(#[case] payload: NotificationPayload) {
        let link = "https://auth.x.test/verify?token=a&callbackURL=%2Fhome";
        let email = make_renderer("https://x.test")
            .render(&make_request(payload), None)
            .unwrap();

        assert!(email.html_body.contains(&format!(r#"href="{link}""#)));
        assert!(email.text_body.contains(link));
    }

    #[test]
    fn test_email_changeのトークンは変更確認パスになる() {
        let email = make_renderer("http://localhost:3000/")
            .render(
                &make_request(NotificationPayload::EmailChange {
                    link_or_token: "tok".to_string(),
                }),
                None,
            )
            .unwrap();

        assert!(
            email
                .text_body
                .contains("http://localhost:3000/api/auth/verify-email-change?token=tok")
        );
    }

    #[test]
    fn test_リンクに含まれる引用符は属性を壊さない() {
        let email = make_renderer("https://x.test")
            .render(
                &make_request(NotificationPayload::VerifyEmail {
                    link_or_token: r#"https://x.test/v?t="><script>"#.to_string(),
                }),
                None,
            )
            .unwrap();

        assert!(!email.html_body.contains("<script>"));
        assert!(
            email
                .html_body
                .contains(r#"href="https://x.test/v?t=%22%3E%3Cscript%3E""#)
        );
    }

    #[test]
    fn test_ユーザー名はhtmlエスケープされる() {
        let request = NotificationRequest::new(
            Recipient::new(Email::new("user@example.com").unwrap())
                .with_name("<b>Eve</b> & Co"),
            NotificationPayload::Welcome,
        );

        let email = make_renderer("https://x.test").render(&request, None).unwrap();

        assert!(!email.html_body.contains("<b>Eve</b>"));
        assert!(email.html_body.contains("Hi &lt;b&gt;Eve&lt;/b&gt; &amp; Co,"));
    }

    #[test]
    fn test_名前がなければ挨拶とプロフィールを省略する() {
        let request = NotificationRequest::new(
            Recipient::new(Email::new("user@example.com").unwrap()),
            NotificationPayload::Welcome,
        );

        let email = make_renderer("https://x.test").render(&request, None).unwrap();

        assert!(email.text_body.contains("Hi,"));
        assert!(!email.html_body.contains("user-profile\">"));
        assert!(email.html_body.contains(r#"href="https://x.test/dashboard""#));
    }

    #[test]
    fn test_アバターがあればプロフィール画像を表示する() {
        let request = NotificationRequest::new(
            Recipient::new(Email::new("user@example.com").unwrap())
                .with_avatar_url("https://cdn.x.test/a.png"),
            NotificationPayload::Welcome,
        );

        let email = make_renderer("https://x.test").render(&request, None).unwrap();

        assert!(
            email
                .html_body
                .contains(r#"<img src="https://cdn.x.test/a.png" alt="User" />"#)
        );
    }

    #[test]
    fn test_ログイン通知は日時_ip_位置_ブラウザを表示する() {
        let details = LoginDetails {
            ip_address: Some("203.0.113.7".to_string()),
            user_agent: Some("Mozilla/5.0".to_string()),
            location:   None,
            timestamp:  None,
        };

        let email = make_renderer("https://x.test")
            .render(
                &make_request(NotificationPayload::LoginAlert(details)),
                Some("Tokyo, Japan"),
            )
            .unwrap();

        assert!(email.text_body.contains("Time: Thu, 02 Jan 2025 03:04:05 GMT"));
        assert!(email.text_body.contains("IP address: 203.0.113.7"));
        assert!(email.text_body.contains("Location: Tokyo, Japan"));
        assert!(email.text_body.contains("Browser: Mozilla/5.0"));
        assert!(email.html_body.contains(r#"href="https://x.test/reset-password""#));
        assert!(email.html_body.contains(r#"href="https://x.test/settings/security""#));
    }

    #[test]
    fn test_ログイン通知は指定された日時を優先しip未指定なら行を省く() {
        let details = LoginDetails {
            timestamp: Some(Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 0).unwrap()),
            ..LoginDetails::default()
        };

        let email = make_renderer("https://x.test")
            .render(&make_request(NotificationPayload::LoginAlert(details)), None)
            .unwrap();

        assert!(email.text_body.contains("Time: Tue, 31 Dec 2024 23:59:00 GMT"));
        assert!(email.text_body.contains("Location: Unknown"));
        assert!(!email.text_body.contains("IP address"));
        assert!(!email.text_body.contains("Browser"));
    }

    #[test]
    fn test_テキスト本文にタグとスタイルが残らない() {
        let email = make_renderer("https://x.test")
            .render(&make_request(NotificationPayload::Welcome), None)
            .unwrap();

        assert!(!email.text_body.contains('<'));
        assert!(!email.text_body.contains("font-family"));
        assert!(email.text_body.starts_with("TOMO Welcome to TOMO! "));
    }

    #[test]
    fn test_url_attrは文字列以外を拒否する() {
        assert!(url_attr(&Value::Bool(true), &HashMap::new()).is_err());
    }
}
