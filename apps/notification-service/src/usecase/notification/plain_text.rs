//! HTML 本文からプレーンテキスト本文を作る

use std::sync::LazyLock;

use regex::Regex;

// パターンはリテラルなので生成に失敗しない
static STYLE_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<style[^>]*>.*?</style>").expect("style ブロックのパターンが不正")
});
static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("タグのパターンが不正"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("空白のパターンが不正"));

/// HTML をプレーンテキストに変換する
///
/// 1. `<style>…</style>` ブロックを除去（大文字小文字を区別せず、複数行対応）
/// 2. 残りのタグをすべて除去
/// 3. 連続する空白を 1 つの半角スペースにまとめ、前後を除去
///
/// 文字参照はデコードしない。
pub fn html_to_text(html: &str) -> String {
    let without_style = STYLE_BLOCK.replace_all(html, "");
    let without_tags = TAG.replace_all(&without_style, "");
    WHITESPACE
        .replace_all(&without_tags, " ")
        .trim()
        .to_string()
}
