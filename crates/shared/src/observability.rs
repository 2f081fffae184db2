//! # 通知リスナーのログ出力
//!
//! 投稿キューを購読し続ける通知プロセスのために、`tracing` の購読者を組み立てる。
//!
//! - 出力形式は `LOG_FORMAT`（`json` / `pretty`）で選ぶ。コンテナ上では `json` を指定し、
//!   `jq` で [`crate::log_business_event`] のイベントだけを抜き出せるようにする
//! - レベルは `RUST_LOG` で上書きできる。未指定なら [`DEFAULT_FILTER`] を使う
//! - `ErrorLayer` を積むので、送信失敗やインフラ障害のエラー値に生成時点の `SpanTrace` が残る

/// `RUST_LOG` 未指定時のフィルタ
///
/// 依存クレートは info に抑え、自前のクレートだけ debug まで出す。
pub const DEFAULT_FILTER: &str = "info,passnotify=debug";

/// 出力形式を選ぶ環境変数名
pub const LOG_FORMAT_VAR: &str = "LOG_FORMAT";

/// ログ出力形式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// 1 行 1 JSON。ログ基盤への転送用
    Json,
    /// 端末で読む用。ローカルでリスナーを動かすとき
    #[default]
    Pretty,
}

impl LogFormat {
    /// `LOG_FORMAT` の値を解釈する
    ///
    /// 前後の空白と大文字小文字は無視する。知らない値なら警告を stderr に出して
    /// [`Pretty`](LogFormat::Pretty) に倒す。購読者の初期化前なので `tracing` は使えない。
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Self::Json,
            "pretty" => Self::Pretty,
            _ => {
                eprintln!("WARNING: unknown {LOG_FORMAT_VAR}={s:?}, falling back to pretty");
                Self::Pretty
            }
        }
    }

    /// 環境変数の値（未設定なら `None`）から形式を決める
    pub fn from_value(value: Option<&str>) -> Self {
        value.map_or_else(Self::default, Self::parse)
    }

    /// `LOG_FORMAT` から読み取る
    pub fn from_env() -> Self {
        Self::from_value(std::env::var(LOG_FORMAT_VAR).ok().as_deref())
    }
}

/// 購読者の初期化設定
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// プロセス名。`main` のルートスパン `service` に載せる
    pub service_name: String,
    pub log_format:   LogFormat,
}

impl TracingConfig {
    pub fn new(service_name: impl Into<String>, log_format: LogFormat) -> Self {
        Self {
            service_name: service_name.into(),
            log_format,
        }
    }

    /// 形式だけ環境変数から読む
    pub fn from_env(service_name: impl Into<String>) -> Self {
        Self::new(service_name, LogFormat::from_env())
    }
}

/// グローバルな購読者を登録する
///
/// プロセス起動直後に一度だけ呼ぶ。二度目の呼び出しは `init()` が panic する。
/// JSON 形式では現在のスパン（`main` が張る `app` スパンの `service`）を
/// 各イベントに添えて出す。
#[cfg(feature = "observability")]
pub fn init_tracing(config: &TracingConfig) {
    use tracing_subscriber::{Layer as _, layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_FILTER.into());

    let fmt_layer = match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_target(true)
            .with_current_span(true)
            .with_span_list(false)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer().with_target(false).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(tracing_error::ErrorLayer::default())
        .init();
}
