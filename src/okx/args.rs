//! `key=value` argument strings.
//!
//! Commands take their arguments as one flat string such as
//! `chainIndex=501 amount=1000 note="two words"`. Parsing is lenient: tokens
//! that do not form a `key=value` pair, or whose quotes never close, are
//! skipped. When a key repeats, the last occurrence wins.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

static ARG_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(\w+)=("([^"]*)"|'([^']*)'|([^'"\s]+))"#).expect("argument pattern is valid")
});

/// Parsed command arguments keyed by parameter name.
pub type CommandArgs = BTreeMap<String, String>;

pub fn parse_command_args(args: &str) -> CommandArgs {
    let mut parsed = CommandArgs::new();
    for caps in ARG_PATTERN.captures_iter(args) {
        let value = caps
            .get(3)
            .or_else(|| caps.get(4))
            .or_else(|| caps.get(5))
            .map(|m| m.as_str())
            .unwrap_or_default();
        parsed.insert(caps[1].to_string(), value.to_string());
    }
    parsed
}

/// Render fields back into an argument string the parser accepts.
///
/// Values containing whitespace are double quoted; empty values are dropped.
pub fn build_args_string<'a, I>(fields: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    fields
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| {
            if value.chars().any(char::is_whitespace) {
                format!("{}=\"{}\"", key, value)
            } else {
                format!("{}={}", key, value)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
