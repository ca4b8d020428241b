//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **JsonFileTaskStore**: JSON ファイルを正本とするストア（サーバー用）
//! - **InMemoryTaskStore**: テスト・組み込み用
//! - **LocalCacheStore**: ネットワークを使わないローカルキャッシュモード
//!
//! HTTP 越しのストア（`HttpTaskStore`）は nidina-cli 側にあります。

mod factory;
mod fs;
pub mod in_memory;
pub mod json_file;
pub mod local_cache;

pub use self::factory::TaskFactory;
pub use self::in_memory::InMemoryTaskStore;
pub use self::json_file::JsonFileTaskStore;
pub use self::local_cache::LocalCacheStore;
