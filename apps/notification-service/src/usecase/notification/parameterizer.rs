//! # パラメータ埋め込み
//!
//! tera テンプレートエンジンで、テンプレート本体に通知パラメータを埋め込む。
//!
//! ## 束縛規則
//!
//! - すべての [`Param`] をテンプレート変数名（`to`、`resource_metadata` など）で束縛する
//! - 未設定のパラメータは空文字（`link_metadata` のみ空配列）
//! - JSON のオブジェクト・配列として解釈できる値は構造化して束縛する。
//!   `{{ resource_metadata.title }}` でメタデータ内の値を参照できる
//! - パラメータを単独で参照した場合（`{{ resource_metadata }}`）は受け取った文字列をそのまま出力する
//! - 変数参照のプレースホルダ（属性・添字・フィルタ付きを含む）は、解決できない場合に空文字を出力する
//! - HTML エスケープは行わない（プレーンテキストのメール本文）

use std::collections::BTreeMap;

use passnotify_domain::notification::Param;
use regex::{Captures, Regex};
use strum::IntoEnumIterator;
use tera::{Context, Tera};
use thiserror::Error;

/// 変数参照のプレースホルダ
///
/// `{{ to }}`、`{{- resource_metadata.title -}}`、`{{ resource_metadata['x'] }}`、
/// `{{ unknown | upper }}` に一致する。演算子・関数呼び出し・リテラルは対象外。
const PLACEHOLDER_PATTERN: &str = concat!(
    r"\{\{(-?)\s*",
    r#"([A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z0-9_]+|\[\s*(?:'[^']*'|"[^"]*"|[A-Za-z0-9_.]+)\s*\])*)"#,
    r"\s*((?:\|[^}]*?)?)\s*(-?)\}\}",
);

/// 受け取った文字列をそのまま束縛する変数名の接尾辞
const RAW_SUFFIX: &str = "__raw";

/// レンダリングエラー
#[derive(Debug, Error)]
pub enum RenderError {
    /// テンプレートが UTF-8 ではない
    #[error("テンプレートが UTF-8 ではありません: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    /// テンプレートの構文エラー・評価エラー
    #[error("テンプレートのレンダリングに失敗: {0}")]
    Template(#[from] tera::Error),

    /// プレースホルダ書き換え規則の構築に失敗
    #[error("プレースホルダ書き換え規則の構築に失敗: {0}")]
    Pattern(#[from] regex::Error),
}

/// パラメータ埋め込み
#[derive(Debug, Clone)]
pub struct Parameterizer {
    placeholder: Regex,
}

impl Parameterizer {
    pub fn new() -> Result<Self, RenderError> {
        Ok(Self {
            placeholder: Regex::new(PLACEHOLDER_PATTERN)?,
        })
    }

    /// テンプレートにパラメータを埋め込む
    pub fn render(
        &self,
        template: &[u8],
        params: &BTreeMap<Param, String>,
    ) -> Result<String, RenderError> {
        let template = std::str::from_utf8(template)?;
        let template = self.placeholder.replace_all(template, rewrite_placeholder);

        Ok(Tera::one_off(&template, &build_context(params), false)?)
    }
}

/// プレースホルダを未解決時に空文字を出力する形へ書き換える
///
/// - パラメータの単独参照は、受け取った文字列を束縛した変数に置き換える
/// - それ以外は先頭に `default` フィルタを差し込む（tera は先頭の `default` のみ未定義変数に適用する）
/// - 先頭が既に `default` のものはそのまま
fn rewrite_placeholder(caps: &Captures<'_>) -> String {
    let (open, path, filters, close) = (&caps[1], &caps[2], caps[3].trim(), &caps[4]);

    if filters.is_empty() && Param::iter().any(|p| p.template_key() == path) {
        return format!("{{{{{open} {path}{RAW_SUFFIX} {close}}}}}");
    }

    let starts_with_default = filters
        .trim_start_matches('|')
        .trim_start()
        .starts_with("default");
    if starts_with_default {
        format!("{{{{{open} {path} {filters} {close}}}}}")
    } else {
        format!("{{{{{open} {path} | default(value=\"\") {filters} {close}}}}}")
    }
}

/// パラメータからテンプレートコンテキストを構築する
fn build_context(params: &BTreeMap<Param, String>) -> Context {
    let mut context = Context::new();

    for param in Param::iter() {
        let key = param.template_key();
        let value = match params.get(&param) {
            Some(raw) => bind_value(raw),
            None if param == Param::Links => serde_json::Value::Array(Vec::new()),
            None => serde_json::Value::String(String::new()),
        };
        context.insert(key, &value);
        context.insert(
            format!("{key}{RAW_SUFFIX}"),
            params.get(&param).map_or("", String::as_str),
        );
    }

    context
}

/// JSON のオブジェクト・配列は構造化し、それ以外は文字列のまま束縛する
fn bind_value(raw: &str) -> serde_json::Value {
    raw.trim_start()
        .starts_with(['{', '['])
        .then(|| serde_json::from_str(raw).ok())
        .flatten()
        .unwrap_or_else(|| serde_json::Value::String(raw.to_string()))
}
