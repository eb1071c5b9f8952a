//! Request and response models shared by the deobfuscator and its HTTP API

use serde::{Deserialize, Serialize};

/// Filename reported when the caller does not supply one
pub const DEFAULT_FILENAME: &str = "unknown.lua";

/// Output mode of the external tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Deobfuscated Lua source
    Bytecode,
    /// Instruction listing
    Disassembly,
}

impl OutputFormat {
    pub fn from_disassembly(disassembly: bool) -> Self {
        if disassembly {
            OutputFormat::Disassembly
        } else {
            OutputFormat::Bytecode
        }
    }

    /// Command-line switch selecting this mode on the external tool
    pub fn tool_flag(self) -> &'static str {
        match self {
            OutputFormat::Bytecode => "-dev",
            OutputFormat::Disassembly => "-dis",
        }
    }
}

fn default_pretty() -> bool {
    true
}

/// A single deobfuscation call
#[derive(Debug, Clone, Deserialize)]
pub struct DeobfuscationRequest {
    /// Lua source or bytecode text
    #[serde(default)]
    pub content: Option<String>,

    /// Request a disassembly listing instead of source
    #[serde(default)]
    pub disassembly: bool,

    /// Run the readability pass over the tool output
    #[serde(default = "default_pretty")]
    pub pretty: bool,

    /// Name of the uploaded file, echoed back in the response
    #[serde(default)]
    pub filename: Option<String>,
}

impl DeobfuscationRequest {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            disassembly: false,
            pretty: true,
            filename: None,
        }
    }

    pub fn format(&self) -> OutputFormat {
        OutputFormat::from_disassembly(self.disassembly)
    }

    pub fn original_filename(&self) -> &str {
        self.filename.as_deref().unwrap_or(DEFAULT_FILENAME)
    }
}

/// Outcome of a deobfuscation call
///
/// `result` is present iff `success` is true. It may be empty: a tool that
/// exits 0 and writes an empty (or, after formatting, blank) file still
/// succeeds. Only a missing output file is reported as a failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeobfuscationResult {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<OutputFormat>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_filename: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeobfuscationResult {
    pub fn succeeded(result: String, format: OutputFormat, original_filename: String) -> Self {
        Self {
            success: true,
            result: Some(result),
            format: Some(format),
            original_filename: Some(original_filename),
            error: None,
        }
    }

    pub fn failed(error: String) -> Self {
        Self {
            success: false,
            result: None,
            format: None,
            original_filename: None,
            error: Some(error),
        }
    }
}

/// Body of `GET /health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,

    /// Whether the build prerequisite answered its version check
    pub dotnet: bool,

    pub moonsec_path: String,

    pub moonsec_exists: bool,

    /// Tool directory mtime in seconds since the Unix epoch, 0 when absent
    pub timestamp: f64,
}
