//! Running the external tool
//!
//! The tool is called as `<launcher> -dev|-dis -i <input> -o <output>`. It
//! reports success through its exit code and writes the result to the
//! output path; this module never looks at the output file.

use moonsec_common::{Error, OutputFormat, Result};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::toolchain::ToolCommand;

/// Characters of stdout/stderr echoed to the log
const LOG_PREVIEW_CHARS: usize = 200;

/// Run the tool once, killing it if it outlives `timeout`.
/// Captured streams are only logged; stderr becomes the error on failure.
pub async fn invoke(
    tool: &ToolCommand,
    format: OutputFormat,
    input: &Path,
    output: &Path,
    timeout: Duration,
) -> Result<()> {
    let mut cmd = tool.command();
    cmd.arg(format.tool_flag())
        .arg("-i")
        .arg(input)
        .arg("-o")
        .arg(output)
        .stdin(Stdio::null())
        .kill_on_drop(true);

    info!(
        "Running command: {} {} -i {} -o {}",
        tool,
        format.tool_flag(),
        input.display(),
        output.display()
    );

    // Dropping the output future on timeout kills the child.
    let result = match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(result) => result?,
        Err(_) => {
            warn!("Tool timed out after {:?}", timeout);
            return Err(Error::Timeout {
                secs: timeout.as_secs_f64(),
            });
        }
    };

    let stdout = String::from_utf8_lossy(&result.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&result.stderr).into_owned();

    info!("Return code: {:?}", result.status.code());
    if !stdout.is_empty() {
        debug!("STDOUT: {}", preview(&stdout));
    }
    if !stderr.is_empty() {
        debug!("STDERR: {}", preview(&stderr));
    }

    if !result.status.success() {
        return Err(Error::tool_failed(&stderr));
    }

    Ok(())
}

fn preview(text: &str) -> &str {
    match text.char_indices().nth(LOG_PREVIEW_CHARS) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
