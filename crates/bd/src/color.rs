// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::builder::styling::{Ansi256Color, Color, Style, Styles};
use std::io::IsTerminal;

use beads_core::Status;

pub mod codes {
    pub const HEADER: u8 = 74;
    pub const LITERAL: u8 = 250;
    pub const CONTEXT: u8 = 245;
    pub const OPEN: u8 = 250;
    pub const IN_PROGRESS: u8 = 178;
    pub const BLOCKED: u8 = 203;
    pub const CLOSED: u8 = 108;
}

/// Priority: `NO_COLOR=1` disables, `COLOR=1` forces, otherwise a TTY check.
pub fn should_colorize() -> bool {
    if std::env::var("NO_COLOR").is_ok_and(|v| v == "1") {
        return false;
    }
    if std::env::var("COLOR").is_ok_and(|v| v == "1") {
        return true;
    }
    std::io::stdout().is_terminal()
}

pub fn styles() -> Styles {
    if !should_colorize() {
        return Styles::plain();
    }
    Styles::styled()
        .header(Style::new().fg_color(Some(Color::Ansi256(Ansi256Color(codes::HEADER)))))
        .literal(Style::new().fg_color(Some(Color::Ansi256(Ansi256Color(codes::LITERAL)))))
        .placeholder(Style::new().fg_color(Some(Color::Ansi256(Ansi256Color(codes::CONTEXT)))))
}

fn fg256(code: u8) -> String {
    format!("\x1b[38;5;{code}m")
}

const RESET: &str = "\x1b[0m";

pub fn status_badge(status: &Status) -> String {
    let code = match status {
        Status::Open => codes::OPEN,
        Status::InProgress => codes::IN_PROGRESS,
        Status::Blocked => codes::BLOCKED,
        Status::Closed => codes::CLOSED,
        Status::Custom(_) => codes::CONTEXT,
    };
    if should_colorize() {
        format!("{}{}{}", fg256(code), status.as_str(), RESET)
    } else {
        status.as_str().to_string()
    }
}
