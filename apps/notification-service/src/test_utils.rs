//! テストユーティリティ
//!
//! 統合テストとユニットテストで共有するセットアップを提供する。

pub mod notification_test_builder;

pub use notification_test_builder::{
    NotificationTestBuilder,
    NotificationTestSetup,
    bundled_template_sets,
};
