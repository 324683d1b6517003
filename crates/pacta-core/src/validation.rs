use std::path::Path;

/// Common validation errors for uploaded document files
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: usize, max: usize },

    #[error("Invalid file extension: {extension} (allowed: {allowed:?})")]
    InvalidExtension {
        extension: String,
        allowed: Vec<String>,
    },

    #[error("Invalid content type: {content_type} (allowed: {allowed:?})")]
    InvalidContentType {
        content_type: String,
        allowed: Vec<String>,
    },

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("Empty file")]
    EmptyFile,
}

/// Document file validator
///
/// Validates size, extension, and content type before a byte is stored.
/// The same ceiling is applied client-side before any network call is made.
pub struct DocumentValidator {
    max_file_size: usize,
    allowed_extensions: Vec<String>,
    allowed_content_types: Vec<String>,
}

impl DocumentValidator {
    pub fn new(
        max_file_size: usize,
        allowed_extensions: Vec<String>,
        allowed_content_types: Vec<String>,
    ) -> Self {
        Self {
            max_file_size,
            allowed_extensions,
            allowed_content_types,
        }
    }

    /// Validate file size
    pub fn validate_file_size(&self, size: usize) -> Result<(), ValidationError> {
        if size == 0 {
            return Err(ValidationError::EmptyFile);
        }

        if size > self.max_file_size {
            return Err(ValidationError::FileTooLarge {
                size,
                max: self.max_file_size,
            });
        }

        Ok(())
    }

    /// Validate file extension
    pub fn validate_extension(&self, filename: &str) -> Result<(), ValidationError> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .ok_or_else(|| ValidationError::InvalidFilename(filename.to_string()))?;

        if !self.allowed_extensions.contains(&extension) {
            return Err(ValidationError::InvalidExtension {
                extension,
                allowed: self.allowed_extensions.clone(),
            });
        }

        Ok(())
    }

    /// Validate content type
    pub fn validate_content_type(&self, content_type: &str) -> Result<(), ValidationError> {
        let normalized = content_type.to_lowercase();

        if !self
            .allowed_content_types
            .iter()
            .any(|ct| ct == &normalized)
        {
            return Err(ValidationError::InvalidContentType {
                content_type: content_type.to_string(),
                allowed: self.allowed_content_types.clone(),
            });
        }

        Ok(())
    }

    /// Validate that Content-Type matches the file extension
    /// This prevents Content-Type spoofing where malicious files are
    /// uploaded with legitimate Content-Types.
    pub fn validate_extension_content_type_match(
        &self,
        filename: &str,
        content_type: &str,
    ) -> Result<(), ValidationError> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .ok_or_else(|| ValidationError::InvalidFilename(filename.to_string()))?;

        let normalized_content_type = content_type.to_lowercase();

        let expected_content_types: Vec<&str> = match extension.as_str() {
            "pdf" => vec!["application/pdf"],
            "doc" => vec!["application/msword"],
            "docx" => {
                vec!["application/vnd.openxmlformats-officedocument.wordprocessingml.document"]
            }
            "xls" => vec!["application/vnd.ms-excel"],
            "xlsx" => vec!["application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"],
            "txt" => vec!["text/plain"],
            "csv" => vec!["text/csv"],
            "rtf" => vec!["application/rtf", "text/rtf"],
            _ => {
                // Unknown extensions skip cross-validation; extension and
                // content-type are still validated individually.
                tracing::debug!(
                    extension = %extension,
                    content_type = %content_type,
                    "Unknown extension, skipping Content-Type/extension cross-validation"
                );
                return Ok(());
            }
        };

        if !expected_content_types
            .iter()
            .any(|ct| ct == &normalized_content_type)
        {
            return Err(ValidationError::InvalidContentType {
                content_type: format!(
                    "{} (does not match extension '{}'. Expected one of: {})",
                    content_type,
                    extension,
                    expected_content_types.join(", ")
                ),
                allowed: self.allowed_content_types.clone(),
            });
        }

        Ok(())
    }

    /// Validate all aspects of a file, including Content-Type/extension matching
    pub fn validate_all(
        &self,
        filename: &str,
        content_type: &str,
        file_size: usize,
    ) -> Result<(), ValidationError> {
        self.validate_file_size(file_size)?;
        self.validate_extension(filename)?;
        self.validate_content_type(content_type)?;
        self.validate_extension_content_type_match(filename, content_type)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_validator() -> DocumentValidator {
        DocumentValidator::new(
            20 * 1024 * 1024, // 20MB
            vec!["pdf".to_string(), "txt".to_string()],
            vec!["application/pdf".to_string(), "text/plain".to_string()],
        )
    }

    #[test]
    fn test_validate_file_size_ok() {
        let validator = test_validator();
        assert!(validator.validate_file_size(5 * 1024 * 1024).is_ok());
    }

    #[test]
    fn test_validate_file_size_too_large() {
        let validator = test_validator();
        assert!(matches!(
            validator.validate_file_size(21 * 1024 * 1024),
            Err(ValidationError::FileTooLarge { .. })
        ));
    }

    #[test]
    fn test_validate_file_size_at_ceiling() {
        let validator = test_validator();
        assert!(validator.validate_file_size(20 * 1024 * 1024).is_ok());
    }

    #[test]
    fn test_validate_file_size_empty() {
        let validator = test_validator();
        assert!(matches!(
            validator.validate_file_size(0),
            Err(ValidationError::EmptyFile)
        ));
    }

    #[test]
    fn test_validate_extension_ok() {
        let validator = test_validator();
        assert!(validator.validate_extension("contract.pdf").is_ok());
        assert!(validator.validate_extension("contract.PDF").is_ok()); // case insensitive
    }

    #[test]
    fn test_validate_extension_invalid() {
        let validator = test_validator();
        assert!(validator.validate_extension("contract.exe").is_err());
    }

    #[test]
    fn test_validate_extension_no_extension() {
        let validator = test_validator();
        assert!(validator.validate_extension("noextension").is_err());
    }

    #[test]
    fn test_validate_content_type_ok() {
        let validator = test_validator();
        assert!(validator.validate_content_type("application/pdf").is_ok());
        assert!(validator.validate_content_type("APPLICATION/PDF").is_ok()); // case insensitive
    }

    #[test]
    fn test_validate_content_type_invalid() {
        let validator = test_validator();
        assert!(validator.validate_content_type("image/png").is_err());
    }

    #[test]
    fn test_validate_extension_content_type_match() {
        let validator = test_validator();
        assert!(validator
            .validate_extension_content_type_match("contract.pdf", "application/pdf")
            .is_ok());
        assert!(validator
            .validate_extension_content_type_match("contract.pdf", "text/plain")
            .is_err());
    }

    #[test]
    fn test_validate_extension_content_type_match_unknown_extension() {
        let validator = test_validator();
        // Unknown extensions do not fail cross-validation
        assert!(validator
            .validate_extension_content_type_match("file.xyz", "application/xyz")
            .is_ok());
    }

    #[test]
    fn test_validate_all_ok() {
        let validator = test_validator();
        assert!(validator
            .validate_all("contract.pdf", "application/pdf", 5 * 1024 * 1024)
            .is_ok());
    }

    #[test]
    fn test_validate_all_fails_on_size() {
        let validator = test_validator();
        assert!(validator
            .validate_all("contract.pdf", "application/pdf", 21 * 1024 * 1024)
            .is_err());
    }
}
