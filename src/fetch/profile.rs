//! Browser Profiles
//!
//! Each profile pairs a platform with its natural default browser so the
//! client-hint headers stay consistent with each other:
//! - `Windows` → Chrome (most popular on Windows)
//! - `Android` → Chrome (most popular on Android)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum BrowserProfile {
    /// Chrome on Windows
    #[default]
    Windows,

    /// Chrome on Android
    Android,
}
