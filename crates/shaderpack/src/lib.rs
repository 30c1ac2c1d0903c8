mod manifest;
mod pack;
mod repository;

pub use manifest::{uniform_value, ShaderPackManifest};
pub use pack::{LocalPack, PackError, MANIFEST_FILE};
pub use repository::{validate_id, PackEntry, ResolveError, ShaderRepository};
