//! UseCase 層のエラー型

use thiserror::Error;

use crate::domain::{RegistryError, UsernameError};

/// ユーザー登録のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    /// ユーザー名の形式が不正
    #[error("invalid username: {0}")]
    InvalidUsername(#[from] UsernameError),

    /// 同じ名前（大文字小文字を区別しない）が既に使われている
    #[error("username '{0}' is already in use")]
    Duplicate(String),

    /// このセッションは既に登録済み
    #[error("session is already registered as '{0}'")]
    AlreadyRegistered(String),
}

impl From<RegistryError> for ConnectError {
    fn from(error: RegistryError) -> Self {
        match error {
            RegistryError::Duplicate(name) => Self::Duplicate(name),
            RegistryError::AlreadyRegistered(name) => Self::AlreadyRegistered(name),
        }
    }
}
