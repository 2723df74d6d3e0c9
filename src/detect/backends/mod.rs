pub mod blob;
pub mod scripted;

pub use blob::BlobBackend;
pub use scripted::ScriptedBackend;
