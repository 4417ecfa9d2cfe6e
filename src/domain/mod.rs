pub mod converter;
pub mod intermediate;
pub mod invocation;
pub mod workspace;

// --- public re-exports ---
pub use converter::Converter;
pub use intermediate::{select_latest, IntermediateImage};
pub use invocation::ProgramInvocation;
pub use workspace::OutputDir;
