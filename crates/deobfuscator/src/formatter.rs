//! Readability pass over tool output
//!
//! This is a text heuristic, not a Lua parser. In bytecode mode it breaks
//! lines at every `;`, `{` and `}` including ones inside string literals
//! and comments, so `print('x;y')` comes out split in two.

use moonsec_common::OutputFormat;

pub fn format_output(content: &str, format: OutputFormat) -> String {
    if content.is_empty() {
        return String::new();
    }

    match format {
        OutputFormat::Disassembly => content
            .split('\n')
            .map(str::trim_end)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n"),
        OutputFormat::Bytecode => {
            let broken = content
                .replace(';', ";\n")
                .replace('{', "{\n")
                .replace('}', "\n}");

            broken
                .split('\n')
                .filter(|line| !line.trim().is_empty())
                .map(str::trim_end)
                .collect::<Vec<_>>()
                .join("\n")
        }
    }
}
