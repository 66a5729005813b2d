/// File-level information command.
pub mod info;
/// Mesh decode command.
pub mod mesh;
/// Record tree printing command.
pub mod tree;
/// Shared output helpers.
pub(crate) mod util;
