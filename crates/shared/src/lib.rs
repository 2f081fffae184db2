//! # PASS 通知サービス 共有ユーティリティ
//!
//! ワークスペース全体で使用される横断的なユーティリティを提供する。
//!
//! ## 設計方針
//!
//! - 他のすべてのクレート（domain, infra, notification-service）から依存される
//! - ビジネスロジックを含まない純粋なユーティリティのみを配置
//! - 外部クレートへの依存は最小限に抑える（subscriber 関連は `observability` feature）

pub mod event_log;
pub mod observability;
