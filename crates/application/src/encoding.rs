//! 不透明载荷（头像等）的编码校验

use data_encoding::BASE64;
use domain::DomainError;

pub trait EncodingValidator: Send + Sync {
    fn validate(&self, field: &str, value: &str) -> Result<(), DomainError>;
}

/// 标准 base64（带填充）校验器
#[derive(Debug, Default, Clone, Copy)]
pub struct Base64Validator;

impl EncodingValidator for Base64Validator {
    fn validate(&self, field: &str, value: &str) -> Result<(), DomainError> {
        BASE64
            .decode(value.as_bytes())
            .map(|_| ())
            .map_err(|err| DomainError::invalid_encoding(field, err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base64_validation() {
        let validator = Base64Validator;
        assert!(validator.validate("image", "aGVsbG8=").is_ok());
        assert!(validator.validate("image", "").is_ok());

        let err = validator.validate("image", "not base64!").unwrap_err();
        assert!(matches!(err, DomainError::InvalidEncoding { ref field, .. } if field == "image"));
        // 缺少填充
        assert!(validator.validate("image", "aGVsbG8").is_err());
    }
}
