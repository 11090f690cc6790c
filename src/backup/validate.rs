//! Validation functions for configuration values.

use validator::ValidationError;

use std::path::Path;

pub fn validate_dir_exist<P: AsRef<Path>>(dir: P) -> Result<(), ValidationError> {
    let dir = dir.as_ref();
    if dir.exists() {
        if !dir.is_dir() {
            return Err(ValidationError::new("InvalidDirectory")
                .with_message(format!("{:?} is not a directory", dir).into()));
        }
    } else {
        return Err(ValidationError::new("InvalidDirectory")
            .with_message(format!("{:?} not found", dir).into()));
    }

    Ok(())
}

/// Accepts an existing directory or a path that does not exist yet
///
/// Nothing is created here, so validating a dry run leaves the filesystem alone.
pub fn validate_dir_or_missing<P: AsRef<Path>>(dir: P) -> Result<(), ValidationError> {
    let dir = dir.as_ref();
    if dir.exists() && !dir.is_dir() {
        return Err(ValidationError::new("InvalidDirectory")
            .with_message(format!("{:?} is not a directory", dir).into()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_validate_dir_exist() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("file");
        std::fs::write(&file, "").unwrap();

        assert!(validate_dir_exist(temp_dir.path()).is_ok());
        assert!(validate_dir_exist(&file).is_err());
        assert!(validate_dir_exist(temp_dir.path().join("missing")).is_err());
    }

    #[test]
    fn test_validate_dir_or_missing() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("file");
        std::fs::write(&file, "").unwrap();
        let missing = temp_dir.path().join("missing");

        assert!(validate_dir_or_missing(temp_dir.path()).is_ok());
        assert!(validate_dir_or_missing(&missing).is_ok());
        assert!(!missing.exists());
        assert!(validate_dir_or_missing(&file).is_err());
    }
}
