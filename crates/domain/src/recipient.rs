//! # 受信者ポリシー
//!
//! 動作モードごとの受信者設定と、受信者を決定するルールを定義する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 備考 |
//! |---|------------|------|
//! | [`Mode`] | 動作モード | `disabled` / `demo` / `production` |
//! | [`RecipientConfig`] | 受信者設定 | モードごとに 1 つ |
//! | [`Whitelist`] | 許可リスト | 空なら全員許可 |
//! | [`RecipientAnalyzer`] | 受信者解析 | イベント種別から受信者を決定 |
//!
//! ## 設計方針
//!
//! - **global_cc は許可リストを通さない**: CC は運用者向けの写しであり、
//!   デモ環境で受信者を絞っても CC には必ず届く
//! - **設定は起動後に読み取り専用**: 並行処理でロックを必要としない

pub mod analyzer;
pub mod whitelist;

pub use analyzer::RecipientAnalyzer;
use serde::{Deserialize, Serialize};
pub use whitelist::Whitelist;

/// 動作モード
///
/// 設定ファイルでは大文字（`DEMO`）と小文字（`demo`）のどちらも受け付ける。
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Mode {
    /// 通知を一切送信しない
    #[default]
    #[serde(alias = "DISABLED")]
    Disabled,
    /// デモ環境（許可リストで受信者を絞り込む運用を想定）
    #[serde(alias = "DEMO")]
    Demo,
    /// 本番環境
    #[serde(alias = "PRODUCTION")]
    Production,
}

/// 受信者設定
///
/// 送信元アドレス、常に CC に含めるアドレス、許可リストを保持する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientConfig {
    pub mode:         Mode,
    /// 常に CC に含めるアドレス（許可リストの対象外）
    #[serde(rename = "global_cc", default)]
    pub global_cc:    Vec<String>,
    /// 許可リスト（未設定・空なら全員許可）
    #[serde(default)]
    pub whitelist:    Option<Vec<String>>,
    #[serde(rename = "fromAddress", alias = "fromaddress")]
    pub from_address: String,
}

impl RecipientConfig {
    /// 空白のエントリを除いた global_cc を返す
    ///
    /// 設定ファイルで未展開のプレースホルダが空文字として残るケースを除外する。
    pub fn effective_global_cc(&self) -> Vec<String> {
        self.global_cc
            .iter()
            .map(|cc| cc.trim())
            .filter(|cc| !cc.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// この設定の許可リストを構築する
    pub fn whitelist(&self) -> Whitelist {
        Whitelist::new(self.whitelist.clone().unwrap_or_default())
    }
}
