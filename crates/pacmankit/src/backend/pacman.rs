//! Real pacman CLI backend.

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::types::{Invocation, PacmanOptions};
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{ChildStderr, Command, Stdio};
use std::thread;

/// Arguments for a non-interactive install, skipping targets already up to date.
const INSTALL_ARGS: &[&str] = &["-S", "--needed", "--noconfirm"];

/// Arguments for a non-interactive install that also reinstalls up-to-date targets.
const REINSTALL_ARGS: &[&str] = &["-S", "--noconfirm"];

/// Arguments for a non-interactive removal, including now-unneeded dependencies.
const REMOVE_ARGS: &[&str] = &["-Rs", "--noconfirm"];

/// Backend that executes real `pacman` commands.
#[derive(Debug)]
pub struct PacmanBackend {
    /// Resolved path to the pacman executable
    binary: PathBuf,
    options: PacmanOptions,
}

impl PacmanBackend {
    /// Create a new PacmanBackend.
    ///
    /// Fails if pacman cannot be found or if any requested sync repository
    /// is not enabled in pacman.conf.
    pub fn new(options: PacmanOptions) -> Result<Self> {
        let binary = find_pacman(&options.binary)?;
        verify_repositories(&options.config, &options.repositories)?;
        log::debug!(
            "Using {} with repositories {}",
            binary.display(),
            options.repositories.join(", ")
        );
        Ok(Self { binary, options })
    }

    /// Run pacman with stdin attached to the terminal and stdout captured.
    ///
    /// stderr is copied to the terminal line by line as pacman writes it and
    /// also kept in the returned [`Invocation`].
    fn run_pacman(&self, base: &[&str], names: &[String]) -> Result<Invocation> {
        let lock = self.options.lock_path();
        if lock.exists() {
            return Err(Error::DatabaseLocked(lock));
        }

        let args: Vec<String> = base
            .iter()
            .map(|a| (*a).to_string())
            .chain(names.iter().cloned())
            .collect();
        log::debug!("Running {} {}", self.binary.display(), args.join(" "));

        let mut child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::CommandFailed {
                message: format!("failed to execute {}: {e}", self.binary.display()),
            })?;

        let stderr_pipe = child.stderr.take();
        let forwarder = thread::spawn(move || forward_stderr(stderr_pipe));

        let mut stdout = Vec::new();
        if let Some(mut pipe) = child.stdout.take() {
            pipe.read_to_end(&mut stdout)?;
        }
        let status = child.wait()?;
        let stderr = forwarder.join().unwrap_or_default();

        let invocation = Invocation {
            args,
            stdout: String::from_utf8_lossy(&stdout).to_string(),
            stderr,
            exit_code: status.code(),
        };
        log::debug!("pacman exited with {:?}", invocation.exit_code);
        Ok(invocation)
    }
}

impl Backend for PacmanBackend {
    fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok_and(|s| s.success())
    }

    fn install(&self, names: &[String]) -> Result<Invocation> {
        self.run_pacman(INSTALL_ARGS, names)
    }

    fn reinstall(&self, names: &[String]) -> Result<Invocation> {
        self.run_pacman(REINSTALL_ARGS, names)
    }

    fn remove(&self, names: &[String]) -> Result<Invocation> {
        self.run_pacman(REMOVE_ARGS, names)
    }
}

/// Copy a child's stderr to ours and return everything that passed through.
fn forward_stderr(pipe: Option<ChildStderr>) -> String {
    let Some(pipe) = pipe else {
        return String::new();
    };

    let mut reader = BufReader::new(pipe);
    let mut terminal = io::stderr();
    let mut captured = String::new();
    let mut line = Vec::new();
    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line) {
            Ok(0) => break,
            Ok(_) => {
                let _ = terminal.write_all(&line);
                let _ = terminal.flush();
                captured.push_str(&String::from_utf8_lossy(&line));
            }
            Err(e) => {
                log::debug!("Stopped reading pacman stderr: {e}");
                break;
            }
        }
    }
    captured
}

/// Find the pacman executable, either by absolute path or in PATH.
fn find_pacman(binary: &str) -> Result<PathBuf> {
    which::which(binary).map_err(|e| Error::PacmanNotFound(format!("{binary}: {e}")))
}

/// List the repository sections of a pacman.conf, excluding `[options]`.
pub fn configured_repositories(config: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(config)?;
    Ok(parse_repositories(&content))
}

fn parse_repositories(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter_map(|l| l.strip_prefix('[')?.strip_suffix(']'))
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != "options")
        .map(String::from)
        .collect()
}

/// Check that every repository is enabled in pacman.conf.
pub fn verify_repositories(config: &Path, repositories: &[String]) -> Result<()> {
    let Some(first) = repositories.first() else {
        return Ok(());
    };
    if !config.is_file() {
        return Err(Error::RepositoryNotConfigured {
            repo: first.clone(),
            config: config.to_path_buf(),
        });
    }

    let configured = configured_repositories(config)?;
    for repo in repositories {
        if !configured.contains(repo) {
            return Err(Error::RepositoryNotConfigured {
                repo: repo.clone(),
                config: config.to_path_buf(),
            });
        }
    }
    Ok(())
}
