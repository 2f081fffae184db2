//! # テンプレートセット
//!
//! 通知種別ごとに件名・本文・フッターのテンプレート参照を束ねる。
//!
//! テンプレート参照は次のいずれかの文字列:
//!
//! - インライン（テンプレート本体そのもの）
//! - `bundled:` / `classpath:` で始まる同梱テンプレートの位置
//! - `file:` で始まる、または絶対パスのファイル
//! - `http://` / `https://` の URL
//!
//! どの形式かの判定と取得はインフラ層のリゾルバが行う。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::notification::NotificationType;

/// テンプレートの区分
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TemplateSection {
    #[serde(alias = "subject")]
    Subject,
    #[serde(alias = "body")]
    Body,
    #[serde(alias = "footer")]
    Footer,
}

impl TemplateSection {
    /// 同梱テンプレートのファイル名に使う小文字名
    pub fn file_stem(self) -> &'static str {
        match self {
            Self::Subject => "subject",
            Self::Body => "body",
            Self::Footer => "footer",
        }
    }
}

/// テンプレートセット
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateSet {
    pub notification: NotificationType,
    #[serde(default)]
    pub templates:    BTreeMap<TemplateSection, String>,
}

impl TemplateSet {
    /// 区分のテンプレート参照を返す
    ///
    /// 区分が未設定の場合は `None`。呼び出し側は空文字として扱う。
    pub fn reference(&self, section: TemplateSection) -> Option<&str> {
        self.templates.get(&section).map(String::as_str)
    }
}

/// テンプレート解決エラー
///
/// すべてのリゾルバで解決できなかったことを表す。
/// 最後の失敗だけでなく、各リゾルバの試行結果をすべて保持する。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("テンプレート '{reference}' を解決できません: [{}]", attempts.join("; "))]
pub struct TemplateResolutionError {
    /// 解決しようとした参照
    pub reference: String,
    /// 各リゾルバの試行結果（`"<リゾルバ名>: <理由>"`）
    pub attempts:  Vec<String>,
}
