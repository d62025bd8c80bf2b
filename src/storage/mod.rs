//! File system storage management
//!
//! Path resolution, file persistence and folder archiving.

pub mod archive;
pub mod naming;
pub mod operations;
pub mod results;
pub mod service;
pub mod validation;

pub use operations::FileStore;
pub use results::{ArchiveBuffer, DeleteReport, DeleteStatus, PathOutcome, StoredFile};
pub use service::StorageService;
pub use validation::{PathResolver, ResolvedPath, StorageRoot};
