//! One deobfuscation request, end to end

use moonsec_common::{DeobfuscationRequest, DeobfuscationResult, Error, Result};
use std::sync::Arc;
use tracing::info;

use crate::exchange::ScratchFiles;
use crate::formatter::format_output;
use crate::invoker;
use crate::toolchain::Toolchain;

#[derive(Clone)]
pub struct Deobfuscator {
    toolchain: Arc<Toolchain>,
}

impl Deobfuscator {
    pub fn new(toolchain: Arc<Toolchain>) -> Self {
        Self { toolchain }
    }

    pub fn toolchain(&self) -> &Arc<Toolchain> {
        &self.toolchain
    }

    /// Validate, run the tool on scratch files and format its output.
    /// Scratch files are gone by the time this returns, whatever the outcome.
    pub async fn run(&self, request: &DeobfuscationRequest) -> Result<DeobfuscationResult> {
        let content = request.content.as_deref().ok_or_else(Error::missing_content)?;

        let config = self.toolchain.config();
        if !self.toolchain.tool_dir_exists() {
            return Err(Error::DependencyMissing {
                path: config.tool_dir.clone(),
            });
        }

        let format = request.format();
        let scratch = ScratchFiles::create(content, config.scratch_dir.as_deref()).await?;

        let tool = self.toolchain.ensure_tool().await?;
        invoker::invoke(
            &tool,
            format,
            scratch.input(),
            scratch.output(),
            config.process_timeout,
        )
        .await?;

        // An empty output file is still a success; only a missing one is an error.
        let raw = scratch.read_output().await?.ok_or(Error::OutputMissing)?;
        let result = if request.pretty {
            format_output(&raw, format)
        } else {
            raw
        };

        info!(
            "Deobfuscated {} ({} bytes in, {} bytes out)",
            request.original_filename(),
            content.len(),
            result.len()
        );

        Ok(DeobfuscationResult::succeeded(
            result,
            format,
            request.original_filename().to_string(),
        ))
    }
}
