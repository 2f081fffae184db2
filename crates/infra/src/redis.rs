//! # Redis 接続管理
//!
//! 通知イベントキューをホストする Redis への接続を管理する。
//!
//! ## 設計方針
//!
//! - **ConnectionManager**: 自動再接続機能を持つ接続マネージャを使用
//! - **非同期対応**: tokio ランタイムとの統合
//! - **ブロッキングコマンドを使わない**: 多重化接続を共有するため、
//!   キューの取り出しは非ブロッキングの `LMOVE` とアイドル時のスリープで行う

use redis::{Client, aio::ConnectionManager};

use crate::error::InfraError;

/// Redis 接続マネージャを作成する
///
/// アプリケーション起動時に一度だけ呼び出し、作成したマネージャを共有する。
///
/// # 引数
///
/// * `redis_url` - Redis 接続 URL
///   - 形式: `redis://[[username:]password@]host[:port][/database]`
///   - TLS: `rediss://` スキームで TLS 接続
pub async fn create_connection_manager(redis_url: &str) -> Result<ConnectionManager, InfraError> {
    let client = Client::open(redis_url)?;
    Ok(ConnectionManager::new(client).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InfraErrorKind;

    #[tokio::test]
    async fn 不正なurlはredisエラーになる() {
        let err = create_connection_manager("not-a-redis-url").await.unwrap_err();
        assert!(matches!(err.kind(), InfraErrorKind::Redis(_)));
    }
}
