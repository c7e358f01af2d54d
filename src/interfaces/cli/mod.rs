// ============================================================
// COMMAND LINE
// ============================================================
// Argument definitions for the `lockit` binary

pub mod commands;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::application::use_cases::duplicate_resolver::DedupeScope;
use crate::domain::loc::LineEnding;

#[derive(Debug, Parser)]
#[command(
    name = "lockit",
    version,
    about = "Validate and repair semicolon-delimited localisation files"
)]
pub struct Cli {
    /// Configuration file (defaults to ./lockit.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log detail (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, Args)]
pub struct WriteArgs {
    /// Report what would change without writing
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the backup copy before rewriting
    #[arg(long)]
    pub no_backup: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Report format problems; exits with status 1 when errors are found
    Validate {
        path: PathBuf,
        #[arg(long, value_enum, default_value_t = ReportFormat::Markdown)]
        format: ReportFormat,
        /// Write the report here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Rewrite files into the exact column, encoding and line ending format
    Fix {
        path: PathBuf,
        #[command(flatten)]
        write: WriteArgs,
        /// Also drop repeated keys within each file
        #[arg(long)]
        dedupe: bool,
    },

    /// Normalize every line break
    LineEndings {
        path: PathBuf,
        /// Defaults to the configured line ending
        #[arg(long, value_enum)]
        target: Option<LineEndingArg>,
        #[command(flatten)]
        write: WriteArgs,
    },

    /// Re-encode files
    Convert {
        path: PathBuf,
        /// Encoding label, defaults to the configured encoding
        #[arg(long)]
        to: Option<String>,
        #[command(flatten)]
        write: WriteArgs,
    },

    /// Remove keys overridden by higher-priority files or repeated in one file
    Dedupe {
        dir: PathBuf,
        #[arg(long, value_enum, default_value_t = ScopeArg::All)]
        scope: ScopeArg,
        #[command(flatten)]
        write: WriteArgs,
        /// Delete removed lines instead of commenting them out
        #[arg(long)]
        delete: bool,
    },

    /// Remove the keys listed in KEYS_FILE from FILE
    RemoveKeys {
        file: PathBuf,
        keys_file: PathBuf,
        #[command(flatten)]
        write: WriteArgs,
        /// Delete removed lines instead of commenting them out
        #[arg(long)]
        delete: bool,
    },

    /// List keys referenced by events, decisions and modifiers with no localisation
    Missing {
        mod_root: PathBuf,
        /// Defaults to MOD_ROOT/localisation
        #[arg(long)]
        localisation: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = SummaryFormat::Markdown)]
        format: SummaryFormat,
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Diff a problem localisation folder against a working reference folder
    Compare {
        problem: PathBuf,
        reference: PathBuf,
        #[arg(long, value_enum, default_value_t = SummaryFormat::Markdown)]
        format: SummaryFormat,
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Markdown,
    Json,
    Csv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SummaryFormat {
    Markdown,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LineEndingArg {
    Crcrlf,
    Crlf,
    Lf,
    Cr,
}

impl From<LineEndingArg> for LineEnding {
    fn from(arg: LineEndingArg) -> Self {
        match arg {
            LineEndingArg::Crcrlf => LineEnding::CrCrLf,
            LineEndingArg::Crlf => LineEnding::CrLf,
            LineEndingArg::Lf => LineEnding::Lf,
            LineEndingArg::Cr => LineEnding::Cr,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScopeArg {
    Within,
    Cross,
    All,
}

impl From<ScopeArg> for DedupeScope {
    fn from(arg: ScopeArg) -> Self {
        match arg {
            ScopeArg::Within => DedupeScope::WithinFile,
            ScopeArg::Cross => DedupeScope::CrossFile,
            ScopeArg::All => DedupeScope::All,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_validate() {
        let cli = Cli::parse_from(["lockit", "-vv", "validate", "loc", "--format", "json"]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Validate { path, format, output } => {
                assert_eq!(path, PathBuf::from("loc"));
                assert_eq!(format, ReportFormat::Json);
                assert!(output.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_dedupe_flags() {
        let cli = Cli::parse_from([
            "lockit", "dedupe", "loc", "--scope", "cross", "--dry-run", "--delete", "--config",
            "x.toml",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
        match cli.command {
            Command::Dedupe {
                scope,
                write,
                delete,
                ..
            } => {
                assert_eq!(DedupeScope::from(scope), DedupeScope::CrossFile);
                assert!(write.dry_run);
                assert!(!write.no_backup);
                assert!(delete);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_line_ending_target() {
        let cli = Cli::parse_from(["lockit", "line-endings", "a.csv", "--target", "crlf"]);
        match cli.command {
            Command::LineEndings { target, .. } => {
                assert_eq!(target.map(LineEnding::from), Some(LineEnding::CrLf));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_compare() {
        let cli = Cli::parse_from(["lockit", "compare", "broken", "working", "--format", "json"]);
        match cli.command {
            Command::Compare {
                problem,
                reference,
                format,
                output,
            } => {
                assert_eq!(problem, PathBuf::from("broken"));
                assert_eq!(reference, PathBuf::from("working"));
                assert_eq!(format, SummaryFormat::Json);
                assert!(output.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_remove_keys_needs_both_paths() {
        assert!(Cli::try_parse_from(["lockit", "remove-keys", "a.csv"]).is_err());
    }
}
