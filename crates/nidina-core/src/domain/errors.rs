//! Errors - エラー型と分類
//!
//! ストア操作の失敗はすべて [`StoreError`] で表し、
//! [`ErrorKind`] で運用上の分類を引けるようにします。

use std::path::PathBuf;

use thiserror::Error;

use super::{TaskKey, TaskStatus};

/// ErrorKind はストアエラーの分類
///
/// - Storage: 読み書き・パースの失敗（呼び出し側には 500 相当）
/// - Rejected: 不正なキーや存在しないタスク、許されない遷移
/// - Conflict: version 不一致（楽観的並行制御）
/// - Transport: リモートストアへの通信失敗
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Storage,
    Rejected,
    Conflict,
    Transport,
}

/// StoreError はストア操作のエラー
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read task file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write task file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("task file {path} is not a valid task list: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("task not found: {0}")]
    NotFound(TaskKey),

    #[error("index {index} is out of range (len={len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("version conflict: expected {expected}, found {found}")]
    VersionConflict { expected: u64, found: u64 },

    #[error("status cannot change from {from} to {to}")]
    InvalidTransition { from: TaskStatus, to: TaskStatus },

    #[error("malformed task key: {0:?}")]
    InvalidKey(String),

    #[error("remote store returned {status}: {message}")]
    Remote {
        status: u16,
        code: String,
        message: String,
    },

    #[error("remote store unreachable: {0}")]
    Transport(String),
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::Read { .. } | StoreError::Write { .. } | StoreError::Corrupt { .. } => {
                ErrorKind::Storage
            }
            StoreError::NotFound(_)
            | StoreError::IndexOutOfRange { .. }
            | StoreError::InvalidTransition { .. }
            | StoreError::InvalidKey(_) => ErrorKind::Rejected,
            StoreError::VersionConflict { .. } => ErrorKind::Conflict,
            StoreError::Remote { status, .. } => match *status {
                409 => ErrorKind::Conflict,
                400..=499 => ErrorKind::Rejected,
                _ => ErrorKind::Storage,
            },
            StoreError::Transport(_) => ErrorKind::Transport,
        }
    }
}
