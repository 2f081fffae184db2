//! # 通知サービス設定
//!
//! プロセス設定（環境変数）と通知設定（設定ファイル）を読み込む。
//!
//! ## 環境変数
//!
//! | 変数名 | デフォルト | 説明 |
//! |--------|-----------|------|
//! | `NOTIFICATION_CONFIG_PATH` | `config/notification.json` | 通知設定ファイル |
//! | `REDIS_URL` | `redis://127.0.0.1:6379` | イベントキューの Redis |
//! | `NOTIFICATION_QUEUE_NAME` | `pass:notification:events` | キュー名 |
//! | `LISTENER_CONCURRENCY` | `4` | 同時処理数 |
//! | `LISTENER_POLL_SECONDS` | `5` | キューが空のときの待機秒数 |
//! | `NOTIFICATION_BACKEND` | `smtp` | `smtp` / `ses` / `noop` |
//! | `PASS_RESOURCE_BASE_URL` | なし | 相対リソース ID の解決先 |
//! | `PASS_USER` / `PASS_PASSWORD` | なし | リソースストアの Basic 認証 |
//!
//! ## 通知設定ファイル
//!
//! JSON / YAML / TOML（拡張子で判定）。`PASS_NOTIFICATION__MODE=production` のように
//! `PASS_NOTIFICATION__` 接頭辞の環境変数で値を上書きできる。

use std::{
    collections::HashSet,
    path::{Path, PathBuf},
    time::Duration,
};

use passnotify_domain::{
    recipient::{Mode, RecipientConfig},
    template::TemplateSet,
};
use passnotify_infra::{
    mail::{MailBackend, SmtpSettings},
    resource::ResourceStoreSettings,
};
use serde::Deserialize;

use crate::error::ConfigError;

/// 通知サービスのプロセス設定
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// 通知設定ファイルのパス
    pub notification_config_path: PathBuf,
    /// Redis 接続 URL
    pub redis_url:                String,
    /// イベントキュー名
    pub queue_name:               String,
    /// 同時に処理するメッセージ数
    pub listener_concurrency:     usize,
    /// キューが空のときの待機時間
    pub poll_interval:            Duration,
    /// メール送信バックエンド
    pub backend:                  MailBackend,
    /// リソースストアの接続設定
    pub resource_store:           ResourceStoreSettings,
}

impl ServiceConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 任意の参照関数から設定を読み込む
    ///
    /// 値が未設定の項目はデフォルト値を使用する。
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let concurrency = var("LISTENER_CONCURRENCY", "4");
        let listener_concurrency = match concurrency.parse::<usize>() {
            Ok(n) if n > 0 => n,
            Ok(_) => {
                return Err(invalid("LISTENER_CONCURRENCY", concurrency, "1 以上である必要があります"));
            }
            Err(e) => return Err(invalid("LISTENER_CONCURRENCY", concurrency, e)),
        };

        let poll = var("LISTENER_POLL_SECONDS", "5");
        let poll_interval = poll
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| invalid("LISTENER_POLL_SECONDS", poll, e))?;

        let backend_name = var("NOTIFICATION_BACKEND", "smtp");
        let backend = backend_name
            .parse::<MailBackend>()
            .map_err(|e| invalid("NOTIFICATION_BACKEND", backend_name, e))?;

        Ok(Self {
            notification_config_path: PathBuf::from(var(
                "NOTIFICATION_CONFIG_PATH",
                "config/notification.json",
            )),
            redis_url: var("REDIS_URL", "redis://127.0.0.1:6379"),
            queue_name: var("NOTIFICATION_QUEUE_NAME", "pass:notification:events"),
            listener_concurrency,
            poll_interval,
            backend,
            resource_store: ResourceStoreSettings {
                base_url: lookup("PASS_RESOURCE_BASE_URL"),
                username: lookup("PASS_USER"),
                password: lookup("PASS_PASSWORD"),
            },
        })
    }
}

fn invalid(key: &'static str, value: String, reason: impl ToString) -> ConfigError {
    ConfigError::InvalidValue {
        key,
        value,
        reason: reason.to_string(),
    }
}

/// 通知設定
///
/// 動作モード、モードごとの受信者設定、通知種別ごとのテンプレートセット、
/// SMTP 接続設定、リンク生成設定を保持する。起動後は読み取り専用。
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationConfig {
    #[serde(default)]
    pub mode:              Mode,
    #[serde(default)]
    pub templates:         Vec<TemplateSet>,
    #[serde(rename = "recipient-config", alias = "recipient_config", default)]
    pub recipient_configs: Vec<RecipientConfig>,
    #[serde(default)]
    pub smtp:              Option<SmtpSettings>,
    #[serde(default)]
    pub link:              Option<LinkSettings>,
}

/// 通知内リンクの設定
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LinkSettings {
    /// アプリケーションのベース URL（例: `https://pass.example.org/app`）
    #[serde(rename = "appBaseUrl", alias = "appbaseurl")]
    pub app_base_url: String,
}

impl NotificationConfig {
    /// 設定ファイルを読み込み、検証する
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(config::Environment::with_prefix("PASS_NOTIFICATION").separator("__"))
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// 設定の整合性を検証する
    ///
    /// - 受信者設定はモードごとに高々 1 つ
    /// - テンプレートセットは通知種別ごとに高々 1 つ
    /// - 動作モードの受信者設定が存在する
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut modes = HashSet::new();
        for rc in &self.recipient_configs {
            if !modes.insert(rc.mode) {
                return Err(ConfigError::DuplicateRecipientConfig(rc.mode));
            }
        }

        let mut types = HashSet::new();
        for set in &self.templates {
            if !types.insert(set.notification) {
                return Err(ConfigError::DuplicateTemplateSet(set.notification));
            }
        }

        if self.recipient_config().is_none() {
            return Err(ConfigError::MissingRecipientConfig(self.mode));
        }

        Ok(())
    }

    /// 動作モードの受信者設定を返す
    pub fn recipient_config(&self) -> Option<&RecipientConfig> {
        self.recipient_configs
            .iter()
            .find(|rc| rc.mode == self.mode)
    }
}
