//! Scratch files handed to the external tool
//!
//! Each request gets a private temporary directory holding the input file
//! and the path the tool writes to. Dropping [`ScratchFiles`] removes the
//! directory and both files with it; removal failures are ignored.

use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const INPUT_NAME: &str = "input.lua";
const OUTPUT_NAME: &str = "input.lua.output";

#[derive(Debug)]
pub struct ScratchFiles {
    _dir: TempDir,
    input: PathBuf,
    output: PathBuf,
}

impl ScratchFiles {
    /// Write `content` to a fresh input file under `scratch_dir` (system temp when `None`)
    pub async fn create(content: &str, scratch_dir: Option<&Path>) -> io::Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("moonsec-");
        let dir = match scratch_dir {
            Some(parent) => builder.tempdir_in(parent)?,
            None => builder.tempdir()?,
        };

        let input = dir.path().join(INPUT_NAME);
        let output = dir.path().join(OUTPUT_NAME);
        tokio::fs::write(&input, content).await?;

        Ok(Self {
            _dir: dir,
            input,
            output,
        })
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Tool output, or `None` when the tool wrote nothing. Invalid UTF-8 is replaced.
    pub async fn read_output(&self) -> io::Result<Option<String>> {
        match tokio::fs::read(&self.output).await {
            Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}
