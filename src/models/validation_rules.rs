use std::borrow::Cow;
use std::collections::HashMap;

use regex::Regex;
use validator::ValidationError;

use super::DiscountCodeId;

pub fn validate_code_format(code: &DiscountCodeId) -> Result<(), ValidationError> {
    lazy_static! {
        static ref CODE_VALIDATION_RE: Regex = Regex::new(r"^[A-Za-z0-9_-]{1,64}$").unwrap();
    }

    if CODE_VALIDATION_RE.is_match(&code.0) {
        Ok(())
    } else {
        Err(ValidationError {
            code: Cow::from("code"),
            message: Some(Cow::from("Code must be 1-64 latin letters, digits, '-' or '_'")),
            params: HashMap::new(),
        })
    }
}
