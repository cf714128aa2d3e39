//! skc: compiles interface specs and authored instructions into agent
//! skills and llms.txt documentation.
//!
//! Provides `skc generate` for building artifacts, `skc diff` for drift
//! checks, `skc validate` for linting instructions and specs, `skc init` for
//! drafting an instructions file, and `skc config` for user settings.

#![warn(missing_docs)]

mod config;
mod diff;
mod generate;
mod init;
mod pipeline;
mod validate;

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use skc_config::DEFAULT_INSTRUCTIONS_FILE;
use tracing_subscriber::EnvFilter;

/// skc: the skill compiler.
#[derive(Parser, Debug)]
#[command(name = "skc", version, about = "Compile interface specs into agent skills")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Show prompt sizes, token usage and timing.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Control colored output.
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate skill artifacts from spec and instructions.
    Generate(GenerateArgs),
    /// Compare lockfile hashes against current inputs.
    Diff(DiffArgs),
    /// Validate instructions and spec consistency.
    Validate(ValidateArgs),
    /// Draft an instructions file from a spec.
    Init(InitArgs),
    /// Manage user settings.
    Config {
        /// The settings action.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Arguments for `skc generate`.
#[derive(Parser, Debug)]
pub struct GenerateArgs {
    /// Path to the instructions file.
    #[arg(long, default_value = DEFAULT_INSTRUCTIONS_FILE)]
    pub instructions: PathBuf,

    /// Spec file replacing the frontmatter sources.
    #[arg(long)]
    pub spec: Option<String>,

    /// Output directory replacing the frontmatter `out`.
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Generate only these artifacts (comma-separated).
    #[arg(long, value_delimiter = ',')]
    pub only: Vec<String>,

    /// Bypass the cache and regenerate every artifact.
    #[arg(long)]
    pub force: bool,

    /// Show what would be generated without calling the provider.
    #[arg(long)]
    pub dry_run: bool,

    /// Show which files would change instead of writing them.
    #[arg(long)]
    pub diff: bool,

    /// Model to use, overriding every other setting.
    #[arg(long)]
    pub model: Option<String>,

    /// Provider to use, overriding every other setting.
    #[arg(long)]
    pub provider: Option<String>,
}

/// Arguments for `skc diff`.
#[derive(Parser, Debug)]
pub struct DiffArgs {
    /// Path to the instructions file.
    #[arg(long, default_value = DEFAULT_INSTRUCTIONS_FILE)]
    pub instructions: PathBuf,

    /// Output directory to compare the current output against.
    #[arg(long)]
    pub against: Option<PathBuf>,
}

/// Arguments for `skc validate`.
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to the instructions file.
    #[arg(long, default_value = DEFAULT_INSTRUCTIONS_FILE)]
    pub instructions: PathBuf,
}

/// Arguments for `skc init`.
#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Project or tool name.
    #[arg(long)]
    pub name: String,

    /// Spec file, CLI binary name, or codebase directory.
    #[arg(long)]
    pub spec: Option<String>,

    /// Kind of spec.
    #[arg(long = "type", value_enum, default_value_t = SpecKind::Openapi)]
    pub kind: SpecKind,

    /// Overwrite an existing instructions file.
    #[arg(long)]
    pub force: bool,
}

/// `skc config` actions.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Set a value.
    Set {
        /// One of `provider`, `model`, `api-key`, `base-url`.
        key: String,
        /// The new value. Empty clears the key.
        value: String,
    },
    /// List current values.
    List,
    /// Remove every value.
    Reset,
}

/// Spec kinds `skc init` can start from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SpecKind {
    /// OpenAPI 3 document.
    Openapi,
    /// CLI binary crawled through its help output.
    Cli,
    /// Source tree.
    Codebase,
}

/// Controls whether colored output is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Detect from the terminal.
    Auto,
    /// Always produce colored output.
    Always,
    /// Never produce colored output.
    Never,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose information.
    pub verbose: bool,
    /// Whether to use colored output.
    pub color: bool,
}

fn main() {
    let cli = Cli::parse();

    let color = match cli.color {
        ColorChoice::Auto => std::io::stderr().is_terminal(),
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        color,
    };
    init_tracing(&global);

    let result = match cli.command {
        Command::Generate(ref args) => generate::run(args, &global),
        Command::Diff(ref args) => diff::run(args, &global),
        Command::Validate(ref args) => validate::run(args, &global),
        Command::Init(ref args) => init::run(args, &global),
        Command::Config { ref action } => config::run(action),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Installs the log subscriber. `RUST_LOG` wins over the flags.
fn init_tracing(global: &GlobalArgs) {
    let default = if global.quiet {
        "error"
    } else if global.verbose {
        "debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(global.color)
        .with_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parse_generate_defaults() {
        let cli = Cli::parse_from(["skc", "generate"]);
        match cli.command {
            Command::Generate(ref args) => {
                assert_eq!(args.instructions, PathBuf::from("COMPILER_INSTRUCTIONS.md"));
                assert!(args.spec.is_none());
                assert!(args.out.is_none());
                assert!(args.only.is_empty());
                assert!(!args.force);
                assert!(!args.dry_run);
                assert!(!args.diff);
            }
            _ => panic!("expected Generate command"),
        }
    }

    #[test]
    fn parse_generate_with_args() {
        let cli = Cli::parse_from([
            "skc",
            "generate",
            "--spec",
            "api.yaml",
            "--out",
            "dist",
            "--only",
            "skill,llms",
            "--force",
            "--model",
            "gpt-4o",
            "--provider",
            "openai",
        ]);
        match cli.command {
            Command::Generate(ref args) => {
                assert_eq!(args.spec.as_deref(), Some("api.yaml"));
                assert_eq!(args.out, Some(PathBuf::from("dist")));
                assert_eq!(args.only, vec!["skill", "llms"]);
                assert!(args.force);
                assert_eq!(args.model.as_deref(), Some("gpt-4o"));
                assert_eq!(args.provider.as_deref(), Some("openai"));
            }
            _ => panic!("expected Generate command"),
        }
    }

    #[test]
    fn parse_dry_run_and_diff() {
        let cli = Cli::parse_from(["skc", "generate", "--dry-run", "--diff"]);
        match cli.command {
            Command::Generate(ref args) => {
                assert!(args.dry_run);
                assert!(args.diff);
            }
            _ => panic!("expected Generate command"),
        }
    }

    #[test]
    fn verbose_is_global() {
        let cli = Cli::parse_from(["skc", "generate", "--verbose"]);
        assert!(cli.verbose);
        assert!(!cli.quiet);
    }

    #[test]
    fn parse_diff_against() {
        let cli = Cli::parse_from(["skc", "diff", "--against", "previous-out"]);
        match cli.command {
            Command::Diff(ref args) => {
                assert_eq!(args.against, Some(PathBuf::from("previous-out")));
            }
            _ => panic!("expected Diff command"),
        }
    }

    #[test]
    fn parse_init() {
        let cli = Cli::parse_from(["skc", "init", "--name", "git", "--spec", "git", "--type", "cli"]);
        match cli.command {
            Command::Init(ref args) => {
                assert_eq!(args.name, "git");
                assert_eq!(args.spec.as_deref(), Some("git"));
                assert_eq!(args.kind, SpecKind::Cli);
                assert!(!args.force);
            }
            _ => panic!("expected Init command"),
        }
    }

    #[test]
    fn init_requires_name() {
        assert!(Cli::try_parse_from(["skc", "init"]).is_err());
    }

    #[test]
    fn parse_config_set() {
        let cli = Cli::parse_from(["skc", "config", "set", "model", "gpt-4o"]);
        match cli.command {
            Command::Config {
                action: ConfigAction::Set { ref key, ref value },
            } => {
                assert_eq!(key, "model");
                assert_eq!(value, "gpt-4o");
            }
            _ => panic!("expected Config Set command"),
        }
    }

    #[test]
    fn parse_color_never() {
        let cli = Cli::parse_from(["skc", "--color", "never", "validate"]);
        assert_eq!(cli.color, ColorChoice::Never);
    }
}
