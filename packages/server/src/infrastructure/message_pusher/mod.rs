//! メッセージ送信（通知）の実装
//!
//! ## 概要
//!
//! このモジュールは `LinePusher` trait の具体的な実装を提供します。
//!
//! ## 実装
//!
//! - `stream`: 任意の `AsyncWrite`（TCP の書き込み側など）に 1 行ずつ書き込む実装

pub mod stream;

pub use stream::StreamLinePusher;
