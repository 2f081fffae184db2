//! # 通知ユースケース
//!
//! 投稿イベントから通知を合成し、テンプレートをレンダリングしてメールで送信する。
//!
//! ## モジュール構成
//!
//! - [`composer`] - 投稿とイベントから通知（送信意図）を合成
//! - [`links`] - 通知内リンクの生成
//! - [`parameterizer`] - tera によるパラメータ埋め込み
//! - [`dispatch`] - テンプレート解決 + レンダリング + 受信者解決 + 送信
//! - [`service`] - 取得 + 自己投稿の判定 + 合成 + ディスパッチの統合サービス
//! - [`bundled_templates`] - バイナリに埋め込む既定テンプレート

pub mod bundled_templates;
pub mod composer;
pub mod dispatch;
pub mod links;
pub mod parameterizer;
pub mod service;

pub use composer::Composer;
pub use dispatch::{DispatchError, DispatchErrorKind, DispatchService, DispatchStage};
pub use links::LinkBuilder;
pub use parameterizer::{Parameterizer, RenderError};
pub use service::{NotificationService, Notifier, NotifyOutcome};
