//! UI utilities for the client.

use std::io::Write;

pub const PROMPT: &str = "> ";

/// Print one server line above the prompt, then redisplay the prompt
pub fn show_server_line(line: &str) {
    // 入力中のプロンプトを消してから表示する
    print!("\r{}\n", line);
    redisplay_prompt();
}

/// Redisplay the prompt after receiving a message
pub fn redisplay_prompt() {
    print!("{}", PROMPT);
    std::io::stdout().flush().ok();
}
