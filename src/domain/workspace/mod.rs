pub mod output_dir;
pub mod workspace_error;

pub use output_dir::OutputDir;
pub use workspace_error::WorkspaceError;
