//! Configuration file parser.
//!
//! The file is a list of `key = value` settings:
//!
//! | Key               | Type          | Default | Meaning                                  |
//! |-------------------|---------------|---------|------------------------------------------|
//! | `indent_width`    | integer ≥ 1   | `4`     | columns per indentation level            |
//! | `yield_each_line` | `true`/`false`| `true`  | yield to the runtime before each line    |
//! | `max_steps`       | integer / `none` | none | abort after this many lines              |
//! | `input_prompt`    | text          | `"? "`  | appended to the variable name on `get`   |
//! | `log_level`       | level name    | unset   | default tracing filter                   |
//!
//! Lines starting with `#` or `;` are comments.  Values may be wrapped in
//! double quotes to keep surrounding spaces.

use std::path::Path;

// ── Public API ────────────────────────────────────────────────────────────────

/// A non-fatal error encountered while loading a config file.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigError {
    pub line: usize,
    pub message: String,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for ConfigError {}

/// Interpreter and binary settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub indent_width: usize,
    pub yield_each_line: bool,
    pub max_steps: Option<u64>,
    pub input_prompt: String,
    pub log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            indent_width: 4,
            yield_each_line: true,
            max_steps: None,
            input_prompt: "? ".to_owned(),
            log_level: None,
        }
    }
}

const LOG_LEVELS: &[&str] = &["off", "error", "warn", "info", "debug", "trace"];

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config string.
    ///
    /// Bad lines are reported and skipped; every other setting still applies.
    pub fn load_str(s: &str) -> (Self, Vec<ConfigError>) {
        let mut config = Config::new();
        let mut errors = Vec::new();

        for (i, raw) in s.lines().enumerate() {
            let lineno = i + 1;
            let line = raw.trim();

            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                errors.push(ConfigError {
                    line: lineno,
                    message: format!("expected `key = value`, found '{line}'"),
                });
                continue;
            };

            if let Err(message) = config.apply(key.trim(), unquote(value.trim())) {
                errors.push(ConfigError { line: lineno, message });
            }
        }

        (config, errors)
    }

    /// Read and parse a config file from disk.
    pub fn load_file(path: &Path) -> std::io::Result<(Self, Vec<ConfigError>)> {
        let s = std::fs::read_to_string(path)?;
        Ok(Self::load_str(&s))
    }

    fn apply(&mut self, key: &str, value: &str) -> Result<(), String> {
        match key {
            "indent_width" => {
                let n: usize = value
                    .parse()
                    .map_err(|_| format!("indent_width: not a number: {value}"))?;
                if n == 0 {
                    return Err("indent_width must be at least 1".to_owned());
                }
                self.indent_width = n;
            }
            "yield_each_line" => {
                self.yield_each_line = parse_bool(value)
                    .ok_or_else(|| format!("yield_each_line: expected true or false, found {value}"))?;
            }
            "max_steps" => {
                self.max_steps = match value {
                    "" | "none" => None,
                    n => Some(
                        n.parse()
                            .map_err(|_| format!("max_steps: not a number: {value}"))?,
                    ),
                };
            }
            "input_prompt" => self.input_prompt = value.to_owned(),
            "log_level" => {
                let level = value.to_ascii_lowercase();
                if !LOG_LEVELS.contains(&level.as_str()) {
                    return Err(format!("log_level: unknown level {value}"));
                }
                self.log_level = Some(level);
            }
            _ => return Err(format!("unknown setting '{key}'")),
        }
        Ok(())
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "true" | "on" | "yes" | "1" => Some(true),
        "false" | "off" | "no" | "0" => Some(false),
        _ => None,
    }
}

/// Strip one pair of surrounding double quotes.
fn unquote(s: &str) -> &str {
    s.strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(s)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = Config::new();
        assert_eq!(c.indent_width, 4);
        assert!(c.yield_each_line);
        assert_eq!(c.max_steps, None);
        assert_eq!(c.input_prompt, "? ");
        assert_eq!(c.log_level, None);
    }

    #[test]
    fn all_settings() {
        let (c, errors) = Config::load_str(
            "indent_width = 2\n\
             yield_each_line = false\n\
             max_steps = 1000\n\
             input_prompt = \"> \"\n\
             log_level = DEBUG\n",
        );
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(c.indent_width, 2);
        assert!(!c.yield_each_line);
        assert_eq!(c.max_steps, Some(1000));
        assert_eq!(c.input_prompt, "> ");
        assert_eq!(c.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn comments_and_blank_lines_ignored() {
        let (c, errors) = Config::load_str("# comment\n\n; another\nmax_steps=5\n");
        assert!(errors.is_empty());
        assert_eq!(c.max_steps, Some(5));
    }

    #[test]
    fn max_steps_none() {
        let (c, errors) = Config::load_str("max_steps = 10\nmax_steps = none\n");
        assert!(errors.is_empty());
        assert_eq!(c.max_steps, None);
    }

    #[test]
    fn bad_lines_are_reported_and_skipped() {
        let (c, errors) = Config::load_str(
            "indent_width = 0\n\
             colour = blue\n\
             just words\n\
             max_steps = lots\n\
             log_level = loud\n\
             yield_each_line = maybe\n\
             input_prompt = >>\n",
        );
        let lines: Vec<usize> = errors.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(c.indent_width, 4);
        assert_eq!(c.input_prompt, ">>");
    }

    #[test]
    fn error_display() {
        let e = ConfigError { line: 3, message: "unknown setting 'x'".into() };
        assert_eq!(e.to_string(), "line 3: unknown setting 'x'");
    }
}
