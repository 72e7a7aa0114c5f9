use std::fmt;

use colored::{Color, Colorize};

/// Colored tag prefix for log lines, used as `println!("{} ...", log::STATE)`.
pub struct Tag(&'static str, Color);

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format!("[{}]", self.0).color(self.1))
    }
}

pub const STATE: Tag = Tag("STATE", Color::Blue);
pub const SCREEN: Tag = Tag("SCREEN", Color::Magenta);
pub const WAKE: Tag = Tag("WAKE", Color::Yellow);
pub const THREAD: Tag = Tag("THREAD", Color::Cyan);
pub const WARN: Tag = Tag("WARN", Color::Yellow);
pub const ERROR: Tag = Tag("ERROR", Color::Red);
