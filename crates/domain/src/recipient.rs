//! # 宛先
//!
//! 通知メールの受信者を表現する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 備考 |
//! |---|------------|------|
//! | [`Email`] | 宛先メールアドレス | 必須。生成時に検証する |
//! | [`Recipient`] | 受信者 | 表示名・アバターは任意 |
//!
//! 受信者情報は認証層から渡される。ユーザーの検索やトークン発行はこのクレートの責務ではない。

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::DomainError;

/// メールアドレスの最大長
const EMAIL_MAX_LENGTH: usize = 255;

/// メールアドレス（値オブジェクト）
///
/// `local@domain` の形式を要求する。
/// 生成時にバリデーションを実行するため、宛先なしの通知リクエストは構築できない。
/// JSON からのデシリアライズ時も同じ検証を通る。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// メールアドレスを作成する
    ///
    /// # バリデーション
    ///
    /// - 前後の空白を除去した上で空文字列ではない
    /// - `@` を含み、ローカル部・ドメイン部がともに空でない
    /// - 最大 255 文字
    ///
    /// # エラー
    ///
    /// バリデーションに失敗した場合は `DomainError::Validation` を返す。
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into().trim().to_string();

        if value.is_empty() {
            return Err(DomainError::Validation(
                "メールアドレスは必須です".to_string(),
            ));
        }

        let Some((local, domain)) = value.split_once('@') else {
            return Err(DomainError::Validation(
                "メールアドレスの形式が不正です".to_string(),
            ));
        };

        if local.is_empty() || domain.is_empty() {
            return Err(DomainError::Validation(
                "メールアドレスの形式が不正です".to_string(),
            ));
        }

        if value.chars().count() > EMAIL_MAX_LENGTH {
            return Err(DomainError::Validation(format!(
                "メールアドレスは{EMAIL_MAX_LENGTH}文字以内である必要があります"
            )));
        }

        Ok(Self(value))
    }

    /// 文字列参照を取得する
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 所有権を持つ文字列に変換する
    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for Email {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

/// 通知メールの受信者
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    /// 宛先メールアドレス
    pub email:      Email,
    /// 表示名（挨拶文とプロフィール欄に使う）
    #[serde(default)]
    pub name:       Option<String>,
    /// アバター画像の URL
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl Recipient {
    /// メールアドレスのみの受信者を作成する
    pub fn new(email: Email) -> Self {
        Self {
            email,
            name: None,
            avatar_url: None,
        }
    }

    /// 表示名を設定する
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// アバター画像の URL を設定する
    pub fn with_avatar_url(mut self, avatar_url: impl Into<String>) -> Self {
        self.avatar_url = Some(avatar_url.into());
        self
    }

    /// 空白のみの表示名を除いた表示名を返す
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().map(str::trim).filter(|n| !n.is_empty())
    }
}
