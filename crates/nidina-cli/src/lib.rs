//! nidina-cli
//!
//! HTTP の Task Store サーバーと、クライアント側のコマンドライン。
//!
//! # モジュール構成
//! - **server**: axum ルーター・ハンドラー・エラー応答
//! - **remote**: HTTP 越しの TaskStore 実装（reqwest）
//! - **config**: 環境変数からの設定
//! - **commands** / **render**: `nidina` のサブコマンドと表示

pub mod commands;
pub mod config;
pub mod remote;
pub mod render;
pub mod server;
