//! Locating and building the external tool
//!
//! The tool is found by probing an ordered list of launch strategies. When
//! none resolves, one build is run and the lookup repeated. Builds are
//! single-flight: concurrent callers attach to the build already running
//! and all of them receive its outcome.

use moonsec_common::{Error, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::UNIX_EPOCH;
use tokio::process::Command;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::ToolchainConfig;

/// One place the tool may live
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchStrategy {
    /// Native executable, run directly
    Executable(PathBuf),
    /// Managed assembly, run through the build program (`dotnet <dll>`)
    Assembly(PathBuf),
}

impl LaunchStrategy {
    pub fn path(&self) -> &Path {
        match self {
            LaunchStrategy::Executable(path) | LaunchStrategy::Assembly(path) => path,
        }
    }

    /// Parse a configured candidate; `.dll` paths are assemblies
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let is_assembly = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("dll"));

        if is_assembly {
            LaunchStrategy::Assembly(path)
        } else {
            LaunchStrategy::Executable(path)
        }
    }
}

/// A resolved launcher for the tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: OsString,
    pub leading_args: Vec<OsString>,
}

impl ToolCommand {
    /// Start a command; callers append the mode and file arguments
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.leading_args);
        cmd
    }
}

impl std::fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program.to_string_lossy())?;
        for arg in &self.leading_args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Build result shared with every waiter; the error carries the build stderr
type BuildOutcome = std::result::Result<(), String>;

type InflightBuild = Arc<Mutex<Option<watch::Receiver<Option<BuildOutcome>>>>>;

pub struct Toolchain {
    config: ToolchainConfig,
    inflight: InflightBuild,
}

impl Toolchain {
    pub fn new(config: ToolchainConfig) -> Self {
        Self {
            config,
            inflight: Arc::new(Mutex::new(None)),
        }
    }

    pub fn config(&self) -> &ToolchainConfig {
        &self.config
    }

    pub fn tool_dir_exists(&self) -> bool {
        self.config.tool_dir.exists()
    }

    /// Tool directory mtime in seconds since the Unix epoch
    pub fn tool_dir_modified(&self) -> Option<f64> {
        let modified = std::fs::metadata(&self.config.tool_dir)
            .and_then(|meta| meta.modified())
            .ok()?;

        modified
            .duration_since(UNIX_EPOCH)
            .ok()
            .map(|elapsed| elapsed.as_secs_f64())
    }

    /// First candidate whose path exists
    pub fn locate(&self) -> Option<ToolCommand> {
        let strategy = self
            .config
            .candidates
            .iter()
            .find(|candidate| candidate.path().exists())?;

        debug!("Resolved tool at {}", strategy.path().display());

        Some(match strategy {
            LaunchStrategy::Executable(path) => ToolCommand {
                program: path.clone().into_os_string(),
                leading_args: Vec::new(),
            },
            LaunchStrategy::Assembly(path) => ToolCommand {
                program: OsString::from(&self.config.build_program),
                leading_args: vec![path.clone().into_os_string()],
            },
        })
    }

    /// Locate the tool, building it at most once if nothing resolves
    pub async fn ensure_tool(&self) -> Result<ToolCommand> {
        if let Some(command) = self.locate() {
            return Ok(command);
        }

        info!("No prebuilt tool found, building");
        self.build().await?;

        self.locate().ok_or(Error::ExecutableNotFound)
    }

    /// Run the clean and build steps, or wait for the build already running
    pub async fn build(&self) -> Result<()> {
        let (mut outcome_rx, leader) = {
            let mut slot = self.inflight.lock().await;
            match slot.as_ref() {
                Some(rx) => {
                    debug!("Build already in progress, waiting for it");
                    (rx.clone(), None)
                }
                None => {
                    let (tx, rx) = watch::channel(None);
                    *slot = Some(rx.clone());
                    (rx, Some(tx))
                }
            }
        };

        // The build runs detached so a cancelled caller cannot orphan the waiters.
        if let Some(tx) = leader {
            let config = self.config.clone();
            let inflight = Arc::clone(&self.inflight);
            tokio::spawn(async move {
                let outcome = run_build(&config).await;
                tx.send_replace(Some(outcome));
                inflight.lock().await.take();
            });
        }

        let outcome = match outcome_rx.wait_for(Option::is_some).await {
            Ok(outcome) => outcome.clone(),
            Err(_) => Some(Err("build task ended without reporting".to_string())),
        };

        match outcome {
            Some(Ok(())) => Ok(()),
            Some(Err(stderr)) => Err(Error::BuildFailure { stderr }),
            None => Err(Error::BuildFailure {
                stderr: String::new(),
            }),
        }
    }

    /// Whether the build program answers `--version`
    pub async fn prerequisite_available(&self) -> bool {
        let check = Command::new(&self.config.build_program)
            .arg("--version")
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        match tokio::time::timeout(self.config.version_check_timeout, check).await {
            Ok(Ok(output)) => output.status.success(),
            Ok(Err(e)) => {
                debug!("{} --version failed: {}", self.config.build_program, e);
                false
            }
            Err(_) => {
                debug!("{} --version timed out", self.config.build_program);
                false
            }
        }
    }

    /// Build in the background at startup when no prebuilt tool exists
    pub fn spawn_startup_build(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        if self.locate().is_some() {
            info!("Prebuilt tool found, skipping startup build");
            return None;
        }

        let toolchain = Arc::clone(self);
        Some(tokio::spawn(async move {
            info!("Building Moonsec Deobfuscator in background");
            match toolchain.build().await {
                Ok(()) => info!("Startup build finished"),
                Err(e) => warn!("Startup build failed: {}", e),
            }
        }))
    }
}

async fn run_build(config: &ToolchainConfig) -> BuildOutcome {
    info!("Building Moonsec Deobfuscator in {}", config.tool_dir.display());

    match run_step(config, &config.clean_args).await {
        Ok(output) if !output.status.success() => {
            warn!(
                "Clean step exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(_) => {}
        Err(e) => warn!("Clean step could not run: {}", e),
    }

    let output = match run_step(config, &config.build_args).await {
        Ok(output) => output,
        Err(e) => {
            error!("Build error: {}", e);
            return Err(e.to_string());
        }
    };

    if output.status.success() {
        info!("Build successful");
        Ok(())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        error!("Build failed: {}", stderr);
        Err(stderr)
    }
}

async fn run_step(config: &ToolchainConfig, args: &[String]) -> std::io::Result<std::process::Output> {
    Command::new(&config.build_program)
        .args(args)
        .current_dir(&config.tool_dir)
        .stdin(Stdio::null())
        .output()
        .await
}
