//! Command-line argument parsing.
//!
//! Usage:
//!   pseudo [-f[<file>]] [-n<steps>] [-d] <program-file>
//!   pseudo [-f[<file>]] [-n<steps>] [-d] -e<program>
//!   pseudo -h

use std::path::PathBuf;

use directories::{BaseDirs, ProjectDirs};

pub const USAGE: &str = "Usage: pseudo [-f[<file>]] [-n<steps>] [-d] (<program-file> | -e<program>)";

// ── Public types ──────────────────────────────────────────────────────────────

/// Parsed command-line arguments.
#[derive(Debug, Default)]
pub struct CliArgs {
    /// Which config file to load.
    pub config: ConfigFile,
    /// Step limit override (`-n<steps>`).
    pub max_steps: Option<u64>,
    /// Debug logging (`-d`).
    pub debug: bool,
    /// Print usage and exit (`-h`).
    pub help: bool,
    /// The program to run; `None` only when `help` is set.
    pub program: Option<ProgramSource>,
}

/// How to choose the config file.
#[derive(Debug, Default)]
pub enum ConfigFile {
    /// Search the standard locations (default).
    #[default]
    Search,
    /// `-f` with no file argument: skip config.
    Skip,
    /// `-f<file>`: load this specific file.
    Explicit(PathBuf),
}

/// Where the program text comes from.
#[derive(Debug, PartialEq)]
pub enum ProgramSource {
    File(PathBuf),
    /// `-e<program>`; `\n` sequences in the text separate lines.
    Inline(String),
}

impl ProgramSource {
    /// Load the program text.
    pub fn read(&self) -> std::io::Result<String> {
        match self {
            ProgramSource::File(path) => std::fs::read_to_string(path),
            ProgramSource::Inline(text) => Ok(text.replace("\\n", "\n")),
        }
    }
}

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Parse `std::env::args()` and return [`CliArgs`] or an error message.
pub fn parse_args() -> Result<CliArgs, String> {
    let raw: Vec<String> = std::env::args().collect();
    parse_argv(raw.get(1..).unwrap_or_default())
}

/// Parse a slice of argument strings (exposed for testing).
///
/// Single-letter flags may be bundled (`-dn50`).  `-n` and `-e` take the rest
/// of their argument, or the next argument when nothing follows the letter.
pub fn parse_argv(argv: &[String]) -> Result<CliArgs, String> {
    let mut args = CliArgs::default();
    let mut positional: Vec<String> = Vec::new();
    let mut rest = argv.iter();

    while let Some(arg) = rest.next() {
        if arg == "--" {
            positional.extend(rest.by_ref().cloned());
            break;
        }
        let Some(flags) = arg.strip_prefix('-').filter(|f| !f.is_empty()) else {
            positional.push(arg.clone());
            continue;
        };

        for (at, c) in flags.char_indices() {
            let tail = &flags[at + c.len_utf8()..];
            match c {
                'd' => args.debug = true,
                'h' => args.help = true,
                // Bare -f skips config, so `-f prog.pseudo` still runs prog.pseudo.
                'f' => {
                    args.config = if tail.is_empty() {
                        ConfigFile::Skip
                    } else {
                        ConfigFile::Explicit(PathBuf::from(tail))
                    };
                    break;
                }
                'n' => {
                    let text = operand(tail, &mut rest).ok_or("-n requires a step count")?;
                    let steps = text
                        .parse()
                        .map_err(|_| format!("invalid step count: {text}"))?;
                    args.max_steps = Some(steps);
                    break;
                }
                'e' => {
                    let text = operand(tail, &mut rest).ok_or("-e requires program text")?;
                    args.program = Some(ProgramSource::Inline(text));
                    break;
                }
                c => return Err(format!("unknown option: -{c}")),
            }
        }
    }

    match (positional.len(), args.program.is_some()) {
        (0, _) => {}
        (1, false) => args.program = Some(ProgramSource::File(PathBuf::from(positional.remove(0)))),
        (1, true) => return Err("give either a program file or -e, not both".to_owned()),
        (n, _) => return Err(format!("too many arguments ({n})")),
    }
    if args.program.is_none() && !args.help {
        return Err("no program given".to_owned());
    }

    Ok(args)
}

/// Value of a flag: the text after the flag letter, else the next argument.
fn operand<'a>(tail: &str, rest: &mut impl Iterator<Item = &'a String>) -> Option<String> {
    if tail.is_empty() {
        rest.next().cloned()
    } else {
        Some(tail.to_owned())
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

/// Candidate config file locations, in search order: the platform config
/// directory (`…/pseudo/config`), `~/.pseudorc`, `./.pseudorc`.
pub fn config_candidates() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(dirs) = ProjectDirs::from("", "", "pseudo") {
        paths.push(dirs.config_dir().join("config"));
    }
    if let Some(base) = BaseDirs::new() {
        paths.push(base.home_dir().join(".pseudorc"));
    }
    paths.push(PathBuf::from("./.pseudorc"));
    paths
}

/// Search for the user config file in the standard locations.
/// Returns the first path that exists, or `None`.
pub fn find_user_config() -> Option<PathBuf> {
    config_candidates().into_iter().find(|p| p.exists())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|&s| s.to_owned()).collect()
    }

    #[test]
    fn program_file() {
        let a = parse_argv(&argv(&["hello.pseudo"])).unwrap();
        assert_eq!(a.program, Some(ProgramSource::File(PathBuf::from("hello.pseudo"))));
        assert!(matches!(a.config, ConfigFile::Search));
        assert!(!a.debug);
    }

    #[test]
    fn inline_embedded_and_separate() {
        let a = parse_argv(&argv(&["-edisplay 1"])).unwrap();
        assert_eq!(a.program, Some(ProgramSource::Inline("display 1".into())));
        let a = parse_argv(&argv(&["-e", "display 2"])).unwrap();
        assert_eq!(a.program, Some(ProgramSource::Inline("display 2".into())));
    }

    #[test]
    fn inline_newlines() {
        let src = ProgramSource::Inline("x = 1\\ndisplay x".into());
        assert_eq!(src.read().unwrap(), "x = 1\ndisplay x");
    }

    #[test]
    fn steps_embedded_and_separate() {
        let a = parse_argv(&argv(&["-n100", "p"])).unwrap();
        assert_eq!(a.max_steps, Some(100));
        let a = parse_argv(&argv(&["-n", "5", "p"])).unwrap();
        assert_eq!(a.max_steps, Some(5));
        assert!(parse_argv(&argv(&["-nlots", "p"])).is_err());
        assert!(parse_argv(&argv(&["p", "-n"])).is_err());
    }

    #[test]
    fn combined_flags() {
        let a = parse_argv(&argv(&["-dfn7", "p"])).unwrap();
        assert!(a.debug);
        // Everything after `f` is the config file name.
        assert!(matches!(&a.config, ConfigFile::Explicit(p) if p == &PathBuf::from("n7")));
    }

    #[test]
    fn bundled_flag_takes_rest_or_next_argument() {
        let a = parse_argv(&argv(&["-dn50", "p"])).unwrap();
        assert!(a.debug);
        assert_eq!(a.max_steps, Some(50));
        let a = parse_argv(&argv(&["-de", "display 3"])).unwrap();
        assert!(a.debug);
        assert_eq!(a.program, Some(ProgramSource::Inline("display 3".into())));
        assert!(parse_argv(&argv(&["-e"])).is_err());
    }

    #[test]
    fn double_dash_ends_flags() {
        let a = parse_argv(&argv(&["-d", "--", "-odd.pseudo"])).unwrap();
        assert_eq!(a.program, Some(ProgramSource::File(PathBuf::from("-odd.pseudo"))));
    }

    #[test]
    fn config_skip_does_not_take_program() {
        let a = parse_argv(&argv(&["-f", "prog.pseudo"])).unwrap();
        assert!(matches!(a.config, ConfigFile::Skip));
        assert_eq!(a.program, Some(ProgramSource::File(PathBuf::from("prog.pseudo"))));
    }

    #[test]
    fn config_explicit() {
        let a = parse_argv(&argv(&["-fmy.rc", "p"])).unwrap();
        assert!(matches!(&a.config, ConfigFile::Explicit(p) if p == &PathBuf::from("my.rc")));
    }

    #[test]
    fn missing_program() {
        assert!(parse_argv(&argv(&[])).is_err());
        assert!(parse_argv(&argv(&["-d"])).is_err());
        assert!(parse_argv(&argv(&["-h"])).unwrap().help);
    }

    #[test]
    fn file_and_inline_conflict() {
        assert!(parse_argv(&argv(&["-edisplay 1", "p"])).is_err());
    }

    #[test]
    fn too_many_positional() {
        assert!(parse_argv(&argv(&["a", "b"])).is_err());
    }

    #[test]
    fn unknown_flag() {
        assert!(parse_argv(&argv(&["-z", "p"])).is_err());
    }

    #[test]
    fn config_search_order_ends_in_cwd() {
        let paths = config_candidates();
        assert_eq!(paths.last(), Some(&PathBuf::from("./.pseudorc")));
    }
}
