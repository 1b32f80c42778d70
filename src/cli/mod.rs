pub mod commands;
pub mod handlers;

pub use commands::{CliArgs, Commands, CompileArgs, DetectArgs};
pub use handlers::{handle_compile, handle_detect};
