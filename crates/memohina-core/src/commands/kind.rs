//! User-facing command names

use crate::error::HinaError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Commands exposed to chat users
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandKind {
    /// Show the latest reasoning
    Think,
    /// Export new records as a snapshot
    Memohina,
}

impl CommandKind {
    pub const ALL: [CommandKind; 2] = [CommandKind::Think, CommandKind::Memohina];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Think => "think",
            Self::Memohina => "memohina",
        }
    }

    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Self::Think => &["思考", "思維鏈"],
            Self::Memohina => &["記憶", "导出会话"],
        }
    }

    /// Resolve a command name or alias, with or without a leading `/`
    pub fn parse(input: &str) -> Option<Self> {
        let name = input.trim().trim_start_matches('/');
        Self::ALL.into_iter().find(|kind| {
            kind.name().eq_ignore_ascii_case(name) || kind.aliases().contains(&name)
        })
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CommandKind {
    type Err = HinaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| {
            HinaError::invalid_input_field(format!("unknown command: {}", s), "command")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_and_aliases_resolve() {
        assert_eq!(CommandKind::parse("think"), Some(CommandKind::Think));
        assert_eq!(CommandKind::parse("/THINK"), Some(CommandKind::Think));
        assert_eq!(CommandKind::parse("思維鏈"), Some(CommandKind::Think));
        assert_eq!(CommandKind::parse("memohina"), Some(CommandKind::Memohina));
        assert_eq!(CommandKind::parse("/导出会话"), Some(CommandKind::Memohina));
        assert_eq!(CommandKind::parse("help"), None);
    }
}
