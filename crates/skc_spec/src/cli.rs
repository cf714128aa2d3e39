//! CLI tools described by crawling their help output.

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::io::{self, Read};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use skc_config::SpecSource;
use skc_diagnostics::{Category, Diagnostic, DiagnosticCode};
use skc_ir::{Group, IntermediateRepr, Operation, Parameter};

use crate::error::PluginError;
use crate::help::parse_help_output;
use crate::plugin::SpecPlugin;

const NO_DESCRIPTION: DiagnosticCode = DiagnosticCode::new(Category::Source, 201);

/// Wall-clock limit for a single help invocation.
pub const HELP_TIMEOUT: Duration = Duration::from_secs(5);

const DEFAULT_HELP_FLAG: &str = "--help";
const DEFAULT_MAX_DEPTH: usize = 3;
const POLL_INTERVAL: Duration = Duration::from_millis(20);

const BLOCK_START: &str = "=== COMMAND: ";
const BLOCK_HEADER_END: &str = " ===\n";
const BLOCK_END: &str = "\n=== END ===";

/// Crawls `<binary> [subcommand...] --help` breadth-first.
#[derive(Debug, Clone)]
pub struct CliPlugin {
    timeout: Duration,
}

impl Default for CliPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl CliPlugin {
    /// Creates the plugin with the standard per-invocation timeout.
    pub fn new() -> Self {
        Self {
            timeout: HELP_TIMEOUT,
        }
    }

    /// Overrides the per-invocation timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl SpecPlugin for CliPlugin {
    fn name(&self) -> &'static str {
        "cli"
    }

    fn detect(&self, source: &SpecSource) -> bool {
        source.is_kind("cli") && source.binary.as_deref().is_some_and(|b| !b.is_empty())
    }

    fn fetch(&self, source: &SpecSource) -> Result<Vec<u8>, PluginError> {
        let binary = source
            .binary
            .as_deref()
            .ok_or_else(|| PluginError::Invalid("cli source needs a binary".to_string()))?;
        let help_flag = source.help_flag.as_deref().unwrap_or(DEFAULT_HELP_FLAG);
        let max_depth = source.max_depth.filter(|d| *d > 0).unwrap_or(DEFAULT_MAX_DEPTH);
        let excluded: HashSet<&str> = source.exclude.iter().map(String::as_str).collect();

        let mut transcript = String::new();
        let mut queue: VecDeque<(Vec<String>, usize)> = VecDeque::from([(Vec::new(), 0)]);

        while let Some((path, depth)) = queue.pop_front() {
            let mut args = path.clone();
            args.push(help_flag.to_string());

            let help = match run_with_timeout(binary, &args, self.timeout) {
                Ok(output) => output,
                Err(e) if path.is_empty() && e.kind() == io::ErrorKind::NotFound => {
                    return Err(PluginError::Command {
                        command: binary.to_string(),
                        reason: "binary not found in PATH".to_string(),
                    });
                }
                Err(e) => {
                    tracing::warn!("{binary} {}: {e}", args.join(" "));
                    format!("(error: {e})")
                }
            };

            if depth < max_depth {
                for sub in parse_help_output(&help).subcommands {
                    if excluded.contains(sub.as_str()) {
                        continue;
                    }
                    let mut child = path.clone();
                    child.push(sub);
                    queue.push_back((child, depth + 1));
                }
            }

            let command = std::iter::once(binary.to_string())
                .chain(path)
                .collect::<Vec<_>>()
                .join(" ");
            tracing::debug!("crawled `{command}`");
            transcript.push_str(&format!("{BLOCK_START}{command}{BLOCK_HEADER_END}{help}\n=== END ===\n\n"));
        }

        Ok(transcript.into_bytes())
    }

    fn parse(&self, raw: &[u8], source: &SpecSource) -> Result<IntermediateRepr, PluginError> {
        let text = String::from_utf8_lossy(raw);
        let mut ir = IntermediateRepr::new();
        if let Some(binary) = &source.binary {
            ir.metadata.insert("binary".to_string(), binary.clone());
        }
        ir.metadata.insert("type".to_string(), "cli".to_string());

        let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (command, help) in split_blocks(&text) {
            let parsed = parse_help_output(help);
            let mut op = Operation::new(command.replace(' ', "_"), "CLI", command);
            op.description = parsed.description;
            op.aliases = parsed.aliases;
            op.parameters = parsed
                .flags
                .into_iter()
                .map(|f| Parameter {
                    name: f.name,
                    location: "flag".to_string(),
                    description: f.description,
                    ty: f.ty,
                    default: f.default,
                    shorthand: f.shorthand,
                    required: false,
                })
                .collect();

            if let Some((parent, _)) = command.rsplit_once(' ') {
                groups.entry(parent.to_string()).or_default().push(op.id.clone());
            }
            ir.operations.push(op);
        }

        ir.operations.sort_by(|a, b| a.id.cmp(&b.id));
        ir.groups = groups
            .into_iter()
            .map(|(name, mut operations)| {
                operations.sort();
                Group {
                    name,
                    description: String::new(),
                    operations,
                }
            })
            .collect();
        Ok(ir)
    }

    fn validate(&self, ir: &IntermediateRepr) -> Vec<Diagnostic> {
        ir.operations
            .iter()
            .filter(|op| op.description.is_empty())
            .map(|op| {
                Diagnostic::warning(
                    NO_DESCRIPTION,
                    format!("command {} has no description (help output may be non-standard)", op.path),
                )
            })
            .collect()
    }
}

/// Splits a crawl transcript into `(command line, help text)` pairs.
fn split_blocks(text: &str) -> Vec<(&str, &str)> {
    text.split(BLOCK_START)
        .skip(1)
        .filter_map(|part| {
            let (command, rest) = part.split_once(BLOCK_HEADER_END)?;
            let help = rest.split_once(BLOCK_END).map_or(rest, |(help, _)| help);
            Some((command, help.trim()))
        })
        .collect()
}

fn drain<R: Read + Send + 'static>(reader: Option<R>) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut r) = reader {
            let _ = r.read_to_end(&mut buf);
        }
        buf
    })
}

fn wait_with_deadline(child: &mut Child, timeout: Duration) -> io::Result<()> {
    let deadline = Instant::now() + timeout;
    loop {
        if child.try_wait()?.is_some() {
            return Ok(());
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("command timed out after {}s", timeout.as_secs_f32()),
            ));
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// Runs the command and returns stdout followed by stderr.
///
/// Many tools print help to stderr or exit non-zero after printing it, so
/// any output counts as success; only silence with a failure is an error.
fn run_with_timeout(binary: &str, args: &[String], timeout: Duration) -> io::Result<String> {
    let mut child = Command::new(binary)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());
    let waited = wait_with_deadline(&mut child, timeout);

    let mut output = stdout.join().unwrap_or_default();
    output.extend(stderr.join().unwrap_or_default());
    waited?;

    if output.is_empty() {
        let status = child.wait()?;
        if !status.success() {
            return Err(io::Error::other(format!("exited with {status}")));
        }
    }
    Ok(String::from_utf8_lossy(&output).into_owned())
}
