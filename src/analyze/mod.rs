pub mod classifier;
pub mod extract;
pub mod signals;
pub mod stats;

pub use classifier::KitRecord;
pub use extract::Workspace;
pub use signals::Detection;
pub use stats::StatsLedger;

/// Extensions the extractor can actually unpack. `.rar` archives are
/// downloaded by the hunter but have no extractor; they stay on disk
/// and never enter the workspace.
pub const EXTRACTABLE_EXTENSIONS: &[&str] = &[".zip", ".tar.gz", ".tgz"];
