//! nidina-core
//!
//! Core building blocks for the nidina task tracker.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, task, state, key, errors）
//! - **ports**: 抽象化レイヤー（TaskStore, Clock, IdGenerator）
//! - **impls**: 実装（JSON ファイル、インメモリ、ローカルキャッシュ）
//! - **app**: アプリケーションロジック（TaskClient, views）

pub mod app;
pub mod domain;
pub mod impls;
pub mod ports;
