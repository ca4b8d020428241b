//! App - アプリケーション層
//!
//! ports を組み合わせて、利用者側のロジックを実装します。
//!
//! # 主要コンポーネント
//! - **TaskClient**: ストアの一覧を mirror として持ち、変更を同期する
//! - **views**: 一覧・カレンダー・概要の導出（読み取り専用）

pub mod client;
pub mod views;

pub use self::client::{ClientError, SyncPolicy, TaskClient, TaskEdit, compose_due};
pub use self::views::{ListTab, Overview, TaskCounts};
