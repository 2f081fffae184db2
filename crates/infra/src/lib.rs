//! # PASS 通知インフラ層
//!
//! 外部システムとの接続・通信を担当するインフラストラクチャ層。
//!
//! ## 設計方針
//!
//! ドメイン層のモデルを入出力とし、外部システムの詳細をカプセル化する。
//! ユースケース層は各 trait のみに依存し、テストでは [`mock`] の実装に差し替える。
//!
//! ## 責務
//!
//! - **リソースストア**: 投稿・投稿イベント・ユーザーの読み取り（HTTP/JSON）
//! - **テンプレート取得**: 同梱・ファイル・HTTP・インラインの各リゾルバと合成
//! - **メール送信**: SMTP / SES / Noop
//! - **イベントキュー**: Redis リストによる信頼性キュー
//!
//! ## 依存関係
//!
//! ```text
//! notification-service → infra → domain
//! ```
//!
//! ## モジュール構成
//!
//! - [`error`] - インフラ層エラー定義
//! - [`mail`] - メール送信
//! - [`queue`] - 通知イベントキュー
//! - [`redis`] - Redis 接続管理
//! - [`resource`] - リソースストア
//! - [`template`] - テンプレート取得

pub mod error;
pub mod mail;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
pub mod queue;
pub mod redis;
pub mod resource;
pub mod template;

pub use error::InfraError;
