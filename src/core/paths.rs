use crate::error::{Error, Result};
use std::env;
use std::path::PathBuf;

/// Base oo-client config directory (~/.config/oo-client/, %APPDATA%\oo-client on Windows)
pub fn oo_client() -> Result<PathBuf> {
    #[cfg(windows)]
    {
        let appdata = env::var("APPDATA").map_err(|_| {
            Error::internal_unexpected(
                "APPDATA environment variable not set on Windows".to_string(),
            )
        })?;
        Ok(PathBuf::from(appdata).join("oo-client"))
    }

    #[cfg(not(windows))]
    {
        let home = env::var("HOME").map_err(|_| {
            Error::internal_unexpected(
                "HOME environment variable not set on Unix-like system".to_string(),
            )
        })?;
        Ok(PathBuf::from(home).join(".config").join("oo-client"))
    }
}

/// Profiles directory
pub fn profiles() -> Result<PathBuf> {
    Ok(oo_client()?.join("profiles"))
}

/// Profile file path
pub fn profile(name: &str) -> Result<PathBuf> {
    Ok(profiles()?.join(format!("{}.json", name)))
}

/// Expand a leading `~` in a user-supplied path.
pub fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}
