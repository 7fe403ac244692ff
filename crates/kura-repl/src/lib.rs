//! kura REPL: interactive shell over a kura store.
//!
//! Each line is one command against the current project:
//!
//! - Files: `cat`, `create`, `write`, `replace`, `insert`, `rm`, `stat`
//! - Directories: `ls`, `mkdir`, `rmdir`
//! - Lifecycle: `mv`, `restore`, `purge`
//! - History: `versions`, `show`, `prune`
//! - Orphans: `orphans`, `adopt`, `drop`
//! - Meta-commands: `/help`, `/quit`, `/project`, `/ns`
//!
//! Arguments split on whitespace. Double quotes group words, and `\n`,
//! `\t`, `\"` and `\\` are unescaped inside them.

pub mod config;
pub mod paths;

use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use rustyline::Editor;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;

use kura_kernel::{
    DEFAULT_KEEP_COUNT, DirEntry, LocalStorage, MemoryStorage, PlainCodec, Project, Storage, Timestamp, Vfs, VfsStat,
};

use crate::config::KuraConfig;

/// REPL state: the engine plus which project and namespace are current.
pub struct Repl {
    vfs: Vfs,
    project: String,
    namespace: Option<String>,
    quit: bool,
}

impl Repl {
    /// A REPL over an existing engine.
    pub fn new(vfs: Vfs, project: impl Into<String>) -> Self {
        Self {
            vfs,
            project: project.into(),
            namespace: None,
            quit: false,
        }
    }

    /// A REPL over a scratch in-memory store.
    pub fn in_memory() -> Self {
        Self::with_storage(Arc::new(MemoryStorage::new()), &KuraConfig::default())
    }

    /// A REPL over the directory-backed store named by `config`.
    pub fn open(config: &KuraConfig) -> Self {
        Self::with_storage(Arc::new(LocalStorage::new(config.store_dir())), config)
    }

    fn with_storage(storage: Arc<dyn Storage>, config: &KuraConfig) -> Self {
        let vfs = Vfs::new(storage, Arc::new(PlainCodec)).with_config(config.vfs_config());
        let mut repl = Self::new(vfs, config.project.clone());
        repl.namespace = config.namespace.clone();
        repl
    }

    /// True once `/quit` has been entered.
    pub fn should_quit(&self) -> bool {
        self.quit
    }

    fn current(&self) -> Project<'_> {
        let project = self.vfs.project(self.project.as_str());
        match &self.namespace {
            Some(ns) => project.with_namespace(ns.as_str()),
            None => project,
        }
    }

    fn prompt(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("蔵 {}:{}> ", self.project, ns),
            None => format!("蔵 {}> ", self.project),
        }
    }

    /// Process a single line of input.
    pub async fn process_line(&mut self, line: &str) -> Result<Option<String>> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return Ok(None);
        }
        if trimmed.starts_with('/') {
            return self.handle_meta_command(trimmed);
        }

        let words = split_args(trimmed)?;
        let Some((command, args)) = words.split_first() else {
            return Ok(None);
        };
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        self.execute(command, &args).await
    }

    async fn execute(&self, command: &str, args: &[&str]) -> Result<Option<String>> {
        let p = self.current();
        match (command, args) {
            ("ls", rest) => {
                let (all, rest) = take_flag(rest, "-a");
                let path = rest.first().copied().unwrap_or("/");
                let entries = p.read_dir(path, all).await?;
                Ok(non_empty(
                    entries.iter().map(format_entry).collect::<Vec<_>>().join("\n"),
                ))
            }
            ("cat", [path]) => {
                let read = p.read_file(path).await?;
                match read.buffer {
                    Some(bytes) => Ok(Some(format!("<binary {}, {} bytes>", read.mime, bytes.len()))),
                    None => Ok(Some(read.content)),
                }
            }
            ("create", [path, text @ ..]) => {
                p.create_file(path, text.join(" ")).await?;
                Ok(Some(format!("created {path}")))
            }
            ("write", [path, text @ ..]) => {
                let version = p.write_file(path, text.join(" ")).await?;
                Ok(Some(format!("wrote {path} (v{version})")))
            }
            ("replace", [path, old, new]) => {
                let result = p.str_replace(path, old, new).await?;
                Ok(Some(format!(
                    "replaced at line {} (v{})\n{}",
                    result.line, result.version, result.snippet
                )))
            }
            ("insert", [path, line, text @ ..]) => {
                let line: usize = line
                    .parse()
                    .with_context(|| format!("line must be a number, got {line:?}"))?;
                let result = p.insert(path, line, &text.join(" ")).await?;
                Ok(Some(format!("inserted (v{})\n{}", result.version, result.snippet)))
            }
            ("rm", [path]) => {
                p.delete_file(path).await?;
                Ok(None)
            }
            ("mkdir", [path]) => {
                p.mkdir(path).await?;
                Ok(None)
            }
            ("rmdir", rest) => {
                let (recursive, rest) = take_flag(rest, "-r");
                let [path] = rest.as_slice() else {
                    bail!("usage: rmdir [-r] <path>");
                };
                p.rmdir(path, recursive).await?;
                Ok(None)
            }
            ("mv", [from, to]) => {
                p.rename(from, to).await?;
                Ok(None)
            }
            ("restore", [path]) => {
                p.restore(path).await?;
                Ok(None)
            }
            ("purge", [path]) => {
                p.purge(path).await?;
                Ok(Some(format!("purged {path}")))
            }
            ("stat", [path]) => Ok(Some(format_stat(&p.stat(path).await?))),
            ("versions", [path]) => {
                let versions = p.list_versions(path).await?;
                Ok(Some(
                    versions
                        .iter()
                        .map(|v| format!("v{:<4} {}", v.version, format_time(v.created_at)))
                        .collect::<Vec<_>>()
                        .join("\n"),
                ))
            }
            ("show", [path, version]) => {
                let version: u64 = version
                    .trim_start_matches('v')
                    .parse()
                    .with_context(|| format!("not a version number: {version:?}"))?;
                Ok(Some(p.get_version(path, version).await?))
            }
            ("prune", [path, rest @ ..]) => {
                let keep = match rest {
                    [] => self.vfs.config().keep_versions.unwrap_or(DEFAULT_KEEP_COUNT),
                    [keep] => keep
                        .parse()
                        .with_context(|| format!("keep must be a number, got {keep:?}"))?,
                    _ => bail!("usage: prune <path> [keep]"),
                };
                p.prune_versions(path, keep).await?;
                Ok(None)
            }
            ("orphans", []) => {
                let orphans = p.list_orphans().await?;
                if orphans.is_empty() {
                    return Ok(Some("(no orphans)".to_string()));
                }
                Ok(Some(
                    orphans
                        .iter()
                        .map(|o| {
                            format!("{}  {}  {}", o.file_id, format_time(o.orphaned_at), o.original_path)
                        })
                        .collect::<Vec<_>>()
                        .join("\n"),
                ))
            }
            ("adopt", [file_id, path]) => {
                p.restore_orphan(file_id, path).await?;
                Ok(Some(format!("restored {file_id} to {path}")))
            }
            ("drop", [file_id]) => {
                p.purge_orphan(file_id).await?;
                Ok(Some(format!("purged orphan {file_id}")))
            }
            (
                "ls" | "cat" | "create" | "write" | "replace" | "insert" | "rm" | "mkdir" | "mv"
                | "restore" | "purge" | "stat" | "versions" | "show" | "prune" | "orphans"
                | "adopt" | "drop",
                _,
            ) => Err(anyhow!("wrong arguments for {command}; see /help")),
            _ => Ok(Some(format!(
                "Unknown command: {command}\nType /help for available commands."
            ))),
        }
    }

    /// Handle a meta-command (starts with /).
    fn handle_meta_command(&mut self, cmd: &str) -> Result<Option<String>> {
        let parts: Vec<&str> = cmd.split_whitespace().collect();
        let command = parts.first().copied().unwrap_or("");

        match (command, &parts[1..]) {
            ("/quit" | "/q" | "/exit", _) => {
                self.quit = true;
                Ok(None)
            }
            ("/help" | "/h" | "/?", _) => Ok(Some(HELP_TEXT.to_string())),
            ("/project", []) => Ok(Some(self.project.clone())),
            ("/project", [name]) => {
                self.project = (*name).to_string();
                Ok(Some(format!("project: {name}")))
            }
            ("/ns", []) => Ok(Some(
                self.namespace.clone().unwrap_or_else(|| "(none)".to_string()),
            )),
            ("/ns", ["-"]) => {
                self.namespace = None;
                Ok(Some("namespace cleared".to_string()))
            }
            ("/ns", [ns]) => {
                self.namespace = Some((*ns).to_string());
                Ok(Some(format!("namespace: {ns}")))
            }
            _ => Ok(Some(format!(
                "Unknown command: {command}\nType /help for available commands."
            ))),
        }
    }
}

/// Split a command line into words, honoring double quotes.
fn split_args(line: &str) -> Result<Vec<String>> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quoted = false;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                quoted = !quoted;
                in_word = true;
            }
            '\\' if quoted => {
                let escaped = chars.next().ok_or_else(|| anyhow!("dangling backslash"))?;
                current.push(match escaped {
                    'n' => '\n',
                    't' => '\t',
                    other => other,
                });
            }
            c if c.is_whitespace() && !quoted => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            c => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if quoted {
        bail!("unterminated quote");
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

/// Strip a leading flag from an argument list.
fn take_flag<'a>(args: &[&'a str], flag: &str) -> (bool, Vec<&'a str>) {
    let present = args.first() == Some(&flag);
    let rest = if present { &args[1..] } else { args };
    (present, rest.to_vec())
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() { None } else { Some(s) }
}

fn format_entry(entry: &DirEntry) -> String {
    let kind = if entry.is_dir() { 'd' } else { '-' };
    let size = entry.size.map(|s| s.to_string()).unwrap_or_default();
    let slash = if entry.is_dir() { "/" } else { "" };
    let deleted = if entry.deleted { "  (deleted)" } else { "" };
    format!("{kind} {size:>8}  {}{slash}{deleted}", entry.name)
}

fn format_stat(stat: &VfsStat) -> String {
    let kind = if stat.is_directory { "directory" } else { "file" };
    format!(
        "type:     {kind}\nsize:     {}\nmime:     {}\nbinary:   {}\ncreated:  {}\nupdated:  {}",
        stat.size,
        stat.mime,
        stat.is_binary,
        format_time(stat.created_at),
        format_time(stat.updated_at),
    )
}

fn format_time(ms: Timestamp) -> String {
    chrono::DateTime::from_timestamp_millis(ms)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| ms.to_string())
}

const HELP_TEXT: &str = r#"蔵 kura — versioned virtual filesystem

Files:
  cat <path>                     Print a file
  create <path> <text...>        Create a new file
  write <path> <text...>         Create or overwrite a file
  replace <path> <old> <new>     Replace a unique string
  insert <path> <line> <text...> Insert text at a line boundary (0 = top)
  rm <path>                      Soft-delete a file
  stat <path>                    Show metadata

Directories:
  ls [-a] [path]                 List (with -a, include deleted entries)
  mkdir <path>                   Create a directory
  rmdir [-r] <path>              Soft-delete a directory

Lifecycle:
  mv <from> <to>                 Move or rename
  restore <path>                 Undo a soft delete
  purge <path>                   Permanently remove a deleted node

History:
  versions <path>                List versions, newest first
  show <path> <n>                Print version n
  prune <path> [keep]            Drop old versions

Orphans:
  orphans                        List orphaned files
  adopt <fileId> <path>          Give an orphan a path again
  drop <fileId>                  Permanently delete an orphan

Meta:
  /project [name]                Show or switch the project
  /ns [namespace | -]            Show, set, or clear the namespace
  /help, /h, /?                  Show this help
  /quit, /q, /exit               Exit

Quote arguments with spaces: write /notes.md "first line\nsecond line"
"#;

/// Run the REPL.
pub fn run(config: KuraConfig) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    println!("蔵 kura v{}", env!("CARGO_PKG_VERSION"));
    println!("Store: {}", config.store_dir().display());
    println!("Type /help for commands, /quit to exit.\n");

    let mut rl: Editor<(), DefaultHistory> = Editor::new().context("Failed to create editor")?;

    let history_path = paths::history_path();
    // Missing history on first run is expected.
    let _ = rl.load_history(&history_path);

    let mut repl = Repl::open(&config);

    while !repl.should_quit() {
        match rl.readline(&repl.prompt()) {
            Ok(line) => {
                let _ = rl.add_history_entry(line.as_str());

                match runtime.block_on(repl.process_line(&line)) {
                    Ok(Some(output)) => println!("{output}"),
                    Ok(None) => {}
                    Err(e) => eprintln!("Error: {e}"),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("^D");
                break;
            }
            Err(err) => {
                eprintln!("Error: {err}");
                break;
            }
        }
    }

    if let Some(parent) = history_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let _ = rl.save_history(&history_path);

    Ok(())
}
