//! Parsing of `--help` output.
//!
//! Help text has no fixed format, so this recognizes the common layouts
//! produced by cobra, clap, click, and argparse: a free-form description, a
//! commands section with one subcommand per indented line, and one or more
//! flag sections.

use std::sync::OnceLock;

use regex::Regex;

/// What could be read out of one command's help text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedHelp {
    /// Leading prose, joined with spaces.
    pub description: String,
    /// Subcommand names in the order listed.
    pub subcommands: Vec<String>,
    /// Flags across every flag section.
    pub flags: Vec<ParsedFlag>,
    /// Alternate names for the command itself.
    pub aliases: Vec<String>,
}

/// One flag line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedFlag {
    /// Long name without dashes, or the short name when there is no long form.
    pub name: String,
    /// Single-letter form without the dash.
    pub shorthand: String,
    /// Value placeholder, e.g. `string` for `--output string`.
    pub ty: String,
    /// Default value mentioned in the description.
    pub default: String,
    /// Text after the flag.
    pub description: String,
}

fn subcommand_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s{2,}([A-Za-z0-9][\w.:-]*)(?:\s{2,}.*|\s+-\s.*)?\s*$")
            .expect("subcommand regex")
    })
}

fn flag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^\s+(?:(-[A-Za-z0-9?]),?\s+)?(--[\w-]+|-[A-Za-z0-9?])(?:[ =](<[^>]+>|\[[^\]]+\]|[A-Za-z_][\w-]*))?(?:\s{2,}(.*))?\s*$",
        )
        .expect("flag regex")
    })
}

fn default_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\[(]default:?\s*([^\])]+)[\])]").expect("default regex"))
}

fn aliases_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?im)^aliases?:[ \t]*\n?[ \t]*(.+)").expect("aliases regex"))
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    Preamble,
    Commands,
    Flags,
    Other,
}

/// A section header is an unindented line ending with `:`.
fn section_header(line: &str) -> Option<String> {
    if line.starts_with(char::is_whitespace) {
        return None;
    }
    let trimmed = line.trim_end();
    let name = trimmed.strip_suffix(':')?;
    (!name.is_empty() && !name.contains(": ")).then(|| name.to_ascii_lowercase())
}

fn classify(name: &str) -> Section {
    if name.ends_with("commands") || name == "subcommands" {
        Section::Commands
    } else if name.contains("flag") || name.contains("option") {
        Section::Flags
    } else {
        Section::Other
    }
}

/// Extracts description, subcommands, flags, and aliases from help text.
pub fn parse_help_output(text: &str) -> ParsedHelp {
    let mut help = ParsedHelp::default();
    let mut description = Vec::new();
    let mut description_done = false;
    let mut section = Section::Preamble;

    for line in text.lines() {
        if let Some(name) = section_header(line) {
            section = classify(&name);
            description_done = true;
            continue;
        }
        let trimmed = line.trim();
        match section {
            Section::Preamble => {
                if trimmed.to_ascii_lowercase().starts_with("usage:") {
                    description_done = true;
                } else if trimmed.is_empty() {
                    if !description.is_empty() {
                        description_done = true;
                    }
                } else if !description_done {
                    description.push(trimmed);
                }
            }
            Section::Commands => {
                if let Some(caps) = subcommand_re().captures(line) {
                    let name = &caps[1];
                    if name != "help" && name != "completion" {
                        help.subcommands.push(name.to_string());
                    }
                }
            }
            Section::Flags => {
                if let Some(flag) = parse_flag_line(line) {
                    help.flags.push(flag);
                }
            }
            Section::Other => {}
        }
    }

    help.description = description.join(" ");
    if let Some(caps) = aliases_re().captures_iter(text).find_map(|c| c.get(1)) {
        help.aliases = caps
            .as_str()
            .split(',')
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(str::to_string)
            .collect();
    }
    help
}

fn parse_flag_line(line: &str) -> Option<ParsedFlag> {
    let caps = flag_re().captures(line)?;
    let first = caps.get(1).map(|m| m.as_str());
    let main = caps.get(2)?.as_str();

    let (name, shorthand) = match main.strip_prefix("--") {
        Some(long) => (long.to_string(), first.map(|s| s[1..].to_string())),
        None => (main[1..].to_string(), Some(main[1..].to_string())),
    };
    let ty = caps
        .get(3)
        .map(|m| m.as_str().trim_matches(|c| matches!(c, '<' | '>' | '[' | ']')).to_string())
        .unwrap_or_default();
    let description = caps.get(4).map(|m| m.as_str().trim().to_string()).unwrap_or_default();
    let default = default_re()
        .captures(&description)
        .map(|c| c[1].trim().trim_matches('"').to_string())
        .unwrap_or_default();

    Some(ParsedFlag {
        name,
        shorthand: shorthand.unwrap_or_default(),
        ty,
        default,
        description,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const COBRA: &str = "\
Manage deployments across environments.

Usage:
  deployctl [command]

Aliases:
  deployctl, dctl

Available Commands:
  apply       Apply a manifest
  rollback    Roll back a release
  help        Help about any command

Flags:
  -c, --config string   config file (default \"~/.deployctl.yaml\")
  -h, --help            help for deployctl
      --verbose         verbose output

Use \"deployctl [command] --help\" for more information about a command.
";

    const CLAP: &str = "\
Build and publish artifacts

Usage: pkg [OPTIONS] <COMMAND>

Commands:
  build  Compile the package
  publish  Upload to the registry

Options:
  -o, --out <DIR>  Output directory [default: dist]
  -q               Quiet mode
  -V, --version    Print version
";

    #[test]
    fn cobra_layout() {
        let help = parse_help_output(COBRA);
        assert_eq!(help.description, "Manage deployments across environments.");
        assert_eq!(help.subcommands, vec!["apply", "rollback"]);
        assert_eq!(help.aliases, vec!["deployctl", "dctl"]);
        assert_eq!(help.flags.len(), 3);

        let config = &help.flags[0];
        assert_eq!(config.name, "config");
        assert_eq!(config.shorthand, "c");
        assert_eq!(config.ty, "string");
        assert_eq!(config.default, "~/.deployctl.yaml");

        let verbose = &help.flags[2];
        assert_eq!(verbose.name, "verbose");
        assert_eq!(verbose.shorthand, "");
        assert_eq!(verbose.description, "verbose output");
    }

    #[test]
    fn clap_layout() {
        let help = parse_help_output(CLAP);
        assert_eq!(help.description, "Build and publish artifacts");
        assert_eq!(help.subcommands, vec!["build", "publish"]);
        assert!(help.aliases.is_empty());

        let out = &help.flags[0];
        assert_eq!(out.name, "out");
        assert_eq!(out.ty, "DIR");
        assert_eq!(out.default, "dist");

        let quiet = &help.flags[1];
        assert_eq!(quiet.name, "q");
        assert_eq!(quiet.shorthand, "q");
        assert_eq!(quiet.description, "Quiet mode");
    }

    #[test]
    fn empty_text() {
        assert_eq!(parse_help_output(""), ParsedHelp::default());
    }

    #[test]
    fn prose_only() {
        let help = parse_help_output("Prints its arguments.\nNothing else.\n\nMore text later.");
        assert_eq!(help.description, "Prints its arguments. Nothing else.");
        assert!(help.subcommands.is_empty());
        assert!(help.flags.is_empty());
    }
}
