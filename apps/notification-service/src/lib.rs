//! # PASS 通知サービス ライブラリ
//!
//! 投稿イベントのキューリスナー、通知の合成・ディスパッチのユースケース、
//! 起動時の設定読み込みを公開する。
//! 統合テスト用に内部モジュールへのアクセスを提供する。

pub mod config;
pub mod error;
pub mod listener;
pub mod usecase;

// テストユーティリティ（内部実装、ドキュメントからは隠す）
#[cfg(any(test, feature = "test-utils"))]
#[doc(hidden)]
pub mod test_utils;
