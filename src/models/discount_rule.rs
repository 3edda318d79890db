//! Model discount rules
use validator::Validate;

use models::{BrandId, RuleId};

use schema::discount_rules;

/// DB presenting by discount rule. Immutable once created.
#[derive(Debug, Serialize, Deserialize, Associations, Queryable, Clone, Identifiable)]
#[table_name = "discount_rules"]
pub struct DiscountRule {
    pub id: RuleId,
    pub brand_id: BrandId,
    pub discount: i32,
}

/// Payload for creating discount rule
#[derive(Serialize, Deserialize, Insertable, Clone, Validate, Debug)]
#[table_name = "discount_rules"]
pub struct NewDiscountRule {
    pub brand_id: BrandId,
    #[validate(range(min = "1", max = "100"))]
    pub discount: i32,
}
