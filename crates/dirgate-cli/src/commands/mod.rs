//! CLI command implementations

pub mod auth;
pub mod check;
pub mod escape;

use crate::OutputFormat;
use dirgate_core::DirgateConfig;

/// Context passed to all commands
pub struct CommandContext {
    pub config: DirgateConfig,
    pub output_format: OutputFormat,
    pub quiet: bool,
}

impl CommandContext {
    /// Check if output should be JSON
    pub fn is_json(&self) -> bool {
        matches!(self.output_format, OutputFormat::Json)
    }

    /// Print info message if not quiet
    pub fn info(&self, msg: &str) {
        if !self.quiet && !self.is_json() {
            eprintln!("{}", msg);
        }
    }
}
