//! # PASS 通知ドメイン層
//!
//! 投稿イベントから通知を組み立てるためのドメインモデルと規則を定義する。
//!
//! ## 設計方針
//!
//! - **純粋なモデル**: I/O（リソースストア、メール送信、テンプレート取得）を一切行わない
//! - **不変な通知**: 合成済みの [`notification::Notification`] はディスパッチまで変更されない
//! - **明示的な失敗**: 未知のイベント種別は [`DomainError::UnsupportedEventType`] で失敗する
//!
//! ## 依存関係の方向
//!
//! ```text
//! notification-service → infra → domain
//! ```
//!
//! ## モジュール構成
//!
//! - [`error`] - ドメイン層で発生するエラーの定義
//! - [`submission`] - 投稿・投稿イベント・ユーザー
//! - [`notification`] - 通知・通知種別・メールメッセージ
//! - [`template`] - テンプレートセット
//! - [`recipient`] - 動作モード・受信者設定・許可リスト・受信者解析
//!
//! ## 使用例
//!
//! ```rust
//! use passnotify_domain::{
//!     notification::NotificationType,
//!     submission::SubmissionEventType,
//! };
//!
//! let notification_type =
//!     NotificationType::for_event(&SubmissionEventType::Submitted).unwrap();
//! assert_eq!(
//!     notification_type,
//!     NotificationType::SubmissionSubmissionSubmitted
//! );
//! ```

#[macro_use]
mod macros;

pub mod error;
pub mod notification;
pub mod recipient;
pub mod submission;
pub mod template;

pub use error::DomainError;
