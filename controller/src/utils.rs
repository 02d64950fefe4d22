//! Utility functions

use serde::{Deserialize, Serialize};

/// Version information for the controller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionInfo {
    pub version: String,
    pub git_hash: String,
    pub build_time: String,
}

/// Get version information
pub fn version_info() -> VersionInfo {
    VersionInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: option_env!("GIT_HASH").unwrap_or("unknown").to_string(),
        build_time: option_env!("BUILD_TIME").unwrap_or("unknown").to_string(),
    }
}

const HEX_CHARS: &[u8; 16] = b"0123456789abcdef";

/// Lowercase hex encoding
pub fn hex_encode(data: impl AsRef<[u8]>) -> String {
    let data = data.as_ref();
    let mut result = String::with_capacity(data.len() * 2);
    for byte in data {
        result.push(HEX_CHARS[(byte >> 4) as usize] as char);
        result.push(HEX_CHARS[(byte & 0x0f) as usize] as char);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_encode() {
        assert_eq!(hex_encode([0x00u8, 0x0f, 0xa5, 0xff]), "000fa5ff");
        assert_eq!(hex_encode(b""), "");
    }

    #[test]
    fn test_version_info_uses_package_version() {
        assert_eq!(version_info().version, env!("CARGO_PKG_VERSION"));
    }
}
