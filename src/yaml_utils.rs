//! YAML utilities for iRacing session info preprocessing
//!
//! iRacing's session document is almost YAML. Two things break standard parsers:
//! - Control characters embedded in strings
//! - Unquoted free-text values (driver and team names) containing `'`, `:`,
//!   `#`, or a leading `,`
//!
//! See: <https://forums.iracing.com/discussion/comment/374646#Comment_374646>

/// Keys whose values are user-entered text and must be quoted.
const FREE_TEXT_KEYS: &[&str] = &[
    "AbbrevName:",
    "TeamName:",
    "UserName:",
    "Initials:",
    "DriverSetupName:",
    "CarDesignStr:", // Car livery color codes - can start with comma
];

/// Preprocess iRacing YAML so `serde_yaml_ng` accepts it.
///
/// Removes control characters other than `\n`, `\r` and `\t`, then wraps the
/// values of free-text keys in single quotes (doubling embedded quotes).
/// Values already wrapped in matching quotes are left alone.
pub fn preprocess_iracing_yaml(yaml: &str) -> String {
    let cleaned: String =
        yaml.chars().filter(|ch| !ch.is_control() || matches!(ch, '\n' | '\r' | '\t')).collect();

    let mut result = String::with_capacity(cleaned.len());
    for (i, line) in cleaned.lines().enumerate() {
        if i > 0 {
            result.push('\n');
        }
        result.push_str(&quote_free_text(line));
    }
    result
}

fn quote_free_text(line: &str) -> std::borrow::Cow<'_, str> {
    for &key in FREE_TEXT_KEYS {
        let Some(key_pos) = line.find(key) else {
            continue;
        };
        let after_key = key_pos + key.len();
        let Some(offset) = line[after_key..].find(|c: char| !c.is_whitespace()) else {
            return line.into();
        };
        let value_start = after_key + offset;
        let value = line[value_start..].trim_end();
        if is_quoted(value) {
            return line.into();
        }
        return format!("{}'{}'", &line[..value_start], value.replace('\'', "''")).into();
    }
    line.into()
}

/// A value wrapped in a matching pair of quotes. `"Fast" Racing` is not.
fn is_quoted(value: &str) -> bool {
    value.len() >= 2
        && ['\'', '"'].iter().any(|&q| value.starts_with(q) && value.ends_with(q))
}
