pub mod docker;
pub mod native;
pub mod rebuild;
pub mod tool;

pub use docker::{DockerOcrmypdf, WorkspaceMount};
pub use native::NativeOcrmypdf;
pub use rebuild::{PdfRebuilder, output_path, sidecar_path};
pub use tool::{RebuildInvocation, RebuildTool, ToolOutput, run_command};
