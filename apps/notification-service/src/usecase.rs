//! # ユースケース層
//!
//! 通知サービスのビジネスロジックを実装する。
//!
//! ## 設計方針
//!
//! - **依存性注入**: リソースストア・メール送信を `Arc<dyn Trait>` で外部から注入
//! - **薄いリスナー**: キューリスナーはメッセージの振り分けのみを行い、処理はユースケースに集約
//!
//! ## モジュール構成
//!
//! - `notification`: 通知の合成・レンダリング・送信

pub mod notification;
