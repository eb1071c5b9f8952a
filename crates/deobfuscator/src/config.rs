//! Toolchain configuration
//!
//! Every filesystem location and external command used by the deobfuscator
//! is carried here and injected, so tests can point it at a fake tool.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::toolchain::LaunchStrategy;

/// Name of the tool's build output, without extension
pub const TOOL_NAME: &str = "MoonsecDeobfuscator";

/// Wall-clock budget for one tool run
pub const DEFAULT_PROCESS_TIMEOUT: Duration = Duration::from_secs(30);

/// Budget for the `--version` prerequisite check
pub const DEFAULT_VERSION_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct ToolchainConfig {
    /// Source checkout of the external tool
    pub tool_dir: PathBuf,

    /// Directory the build step writes the tool into
    pub build_output_dir: PathBuf,

    /// Where to look for a runnable tool, in priority order
    pub candidates: Vec<LaunchStrategy>,

    /// Program used to build the tool and to launch assemblies
    pub build_program: String,

    pub clean_args: Vec<String>,

    pub build_args: Vec<String>,

    pub process_timeout: Duration,

    pub version_check_timeout: Duration,

    /// Parent directory for scratch files, system temp dir when unset
    pub scratch_dir: Option<PathBuf>,
}

impl ToolchainConfig {
    /// Defaults for a .NET checkout at `tool_dir`
    pub fn new(tool_dir: impl Into<PathBuf>) -> Self {
        let tool_dir = tool_dir.into();
        let build_output_dir = tool_dir.join("bin").join("Release").join("net8.0");
        let candidates = default_candidates(&build_output_dir);

        Self {
            tool_dir,
            build_output_dir,
            candidates,
            build_program: "dotnet".to_string(),
            clean_args: vec!["clean".into(), "-c".into(), "Release".into()],
            build_args: vec!["build".into(), "-c".into(), "Release".into()],
            process_timeout: DEFAULT_PROCESS_TIMEOUT,
            version_check_timeout: DEFAULT_VERSION_CHECK_TIMEOUT,
            scratch_dir: None,
        }
    }

    /// Move the build output and recompute the default candidates for it
    pub fn with_build_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.build_output_dir = dir.into();
        self.candidates = default_candidates(&self.build_output_dir);
        self
    }

    pub fn with_candidates(mut self, candidates: Vec<LaunchStrategy>) -> Self {
        self.candidates = candidates;
        self
    }

    pub fn with_process_timeout(mut self, timeout: Duration) -> Self {
        self.process_timeout = timeout;
        self
    }
}

/// Windows executable, native executable, then the managed assembly
pub fn default_candidates(build_output_dir: &Path) -> Vec<LaunchStrategy> {
    vec![
        LaunchStrategy::Executable(build_output_dir.join(format!("{TOOL_NAME}.exe"))),
        LaunchStrategy::Executable(build_output_dir.join(TOOL_NAME)),
        LaunchStrategy::Assembly(build_output_dir.join(format!("{TOOL_NAME}.dll"))),
    ]
}
