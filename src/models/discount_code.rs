//! Model discount codes
use chrono::NaiveDate;
use validator::Validate;

use models::validation_rules::*;
use models::{DiscountCodeId, RuleId};

use schema::discount_codes;

/// DB presenting by discount code. The id is the code itself and is
/// supplied by the caller; codes are never updated or deleted.
#[derive(Debug, Serialize, Deserialize, Associations, Queryable, Clone, Identifiable)]
#[table_name = "discount_codes"]
pub struct DiscountCode {
    pub id: DiscountCodeId,
    pub rule_id: RuleId,
    pub valid_until: NaiveDate,
}

impl DiscountCode {
    pub const GENERATED_CODE_LENGTH: usize = 12;
}

/// Payload for creating discount code
#[derive(Serialize, Deserialize, Insertable, Clone, Validate, Debug)]
#[table_name = "discount_codes"]
pub struct NewDiscountCode {
    #[validate(custom = "validate_code_format")]
    pub id: DiscountCodeId,
    pub rule_id: RuleId,
    /// Defaults to the day the code is created.
    pub valid_until: Option<NaiveDate>,
}
