//! HTTP API DTOs.

use serde::{Deserialize, Serialize};

/// `GET /api/users` response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsersDto {
    pub count: usize,
    pub usernames: Vec<String>,
}

/// `GET /api/history` response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryDto {
    pub capacity: usize,
    pub lines: Vec<String>,
}
