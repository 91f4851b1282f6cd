pub mod engine;
pub mod fingerprint;
pub mod ledger;
pub mod reducer;
pub mod validate;

pub use engine::{HuntOutcome, KitHunter};
pub use ledger::OriginLedger;

/// The three archive extensions kits are most commonly packaged with.
pub const MAIN_EXTENSIONS: &[&str] = &[".zip", ".tar.gz", ".rar"];

/// Extended probe list covering legacy compression formats occasionally
/// seen on older hosting panels.
pub const ALL_EXTENSIONS: &[&str] = &[
    ".zip", ".tar.gz", ".tgz", ".rar", ".arc", ".arj", ".as", ".b64", ".btoa", ".bz", ".bz2",
    ".cab", ".cpt", ".gz", ".hqx", ".iso", ".lha", ".lzh", ".mim", ".mme", ".pak", ".pf", ".rpm",
    ".sea", ".sit", ".sitx", ".tbz", ".tbz2", ".uu", ".uue", ".z", ".zipx", ".zoo",
];
