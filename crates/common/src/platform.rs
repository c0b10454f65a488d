//! Bundle target platforms.

use serde::{Deserialize, Serialize};

/// Operating system a desktop bundle ships a binary for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Linux,
    Darwin,
    Windows,
}

impl Platform {
    /// Every platform, in manifest order.
    pub const ALL: [Platform; 3] = [Platform::Linux, Platform::Darwin, Platform::Windows];

    pub fn is_windows(&self) -> bool {
        matches!(self, Platform::Windows)
    }

    /// Platform-specific form of a POSIX binary path.
    pub fn binary_path(&self, posix_path: &str) -> String {
        if self.is_windows() {
            format!("{posix_path}.exe")
        } else {
            posix_path.to_string()
        }
    }
}
