//! メール内リンクの組み立て
//!
//! 認証層は完成したリンクを渡すこともあれば、トークンだけを渡すこともある。
//! どちらで渡されても同じリンクになるよう、ここで正規化する。

use tomo_domain::notification::NotificationKind;
use url::Url;

/// 通知種別ごとのリンクパス（リンクを持たない種別は `None`）
pub fn action_path(kind: NotificationKind) -> Option<&'static str> {
    match kind {
        NotificationKind::VerifyEmail => Some("/api/auth/verify-email"),
        NotificationKind::ResetPassword => Some("/reset-password"),
        NotificationKind::EmailChange => Some("/api/auth/verify-email-change"),
        NotificationKind::Welcome | NotificationKind::LoginAlert => None,
    }
}

/// リンクまたはトークンから最終的なリンクを作る
///
/// - `http` / `https` の絶対 URL はそのまま使う
/// - それ以外はトークンとみなし `{base_url}{path}?token={urlencode(token)}` を返す
///
/// `base_url` 末尾の `/` は無視する。
pub fn resolve_action_link(base_url: &str, path: &str, link_or_token: &str) -> String {
    let value = link_or_token.trim();

    if is_absolute_http_url(value) {
        return value.to_string();
    }

    format!(
        "{}{}?token={}",
        base_url.trim_end_matches('/'),
        path,
        urlencoding::encode(value)
    )
}

fn is_absolute_http_url(value: &str) -> bool {
    Url::parse(value).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
}
