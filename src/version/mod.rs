//! Version parsing for migration filenames.
//!
//! Migration files are named `<version>__<description>.<ext>`. The version
//! token is coerced leniently into a full semantic version and the
//! description loses its extension.

mod types;

pub use types::{SemVer, VersionError};

use crate::utils::FILENAME_SEPARATOR;

/// Version and description extracted from a migration filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedName {
    pub version: SemVer,
    pub description: String,
}

/// Parse a migration filename.
///
/// Returns `Ok(None)` for names that are not migrations at all: hidden files
/// and names without the `__` separator. Returns an error when the name looks
/// like a migration but breaks the naming contract.
pub fn parse_filename(filename: &str) -> Result<Option<ParsedName>, VersionError> {
    if filename.starts_with('.') {
        return Ok(None);
    }

    let mut parts = filename.split(FILENAME_SEPARATOR);
    let version_token = parts.next().unwrap_or_default();
    let Some(description_token) = parts.next() else {
        return Ok(None);
    };

    let description = strip_extension(description_token);

    let Some(version) = SemVer::coerce(version_token) else {
        if description.is_empty() {
            return Ok(None);
        }
        return Err(VersionError::InvalidFilenameFormat {
            filename: filename.to_string(),
            missing: "semver",
        });
    };

    if description.is_empty() {
        return Err(VersionError::InvalidFilenameFormat {
            filename: filename.to_string(),
            missing: "description",
        });
    }

    Ok(Some(ParsedName {
        version,
        description: description.to_string(),
    }))
}

/// Drop the last extension, leaving dotfile-style tokens intact.
fn strip_extension(token: &str) -> &str {
    match token.rfind('.') {
        Some(index) if index > 0 => &token[..index],
        _ => token,
    }
}
