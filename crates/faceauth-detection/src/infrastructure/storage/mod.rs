//! Filesystem adapters: reference images in, annotated frames out.

pub mod archive;
pub mod persons;

pub use archive::DirectoryArchive;
pub use persons::DirectoryReferenceLoader;
