// Include the command builder directly from commands.rs
#[path = "commands.rs"]
pub mod commands;

// Re-export for integration tests and embedding
pub use commands::{command_argument_builder, CLAP_STYLING};

// Re-export survey functionality from cartograph-core
pub use cartograph_core::{execute_survey, FsArtifactWriter, SurveyOutcome};
