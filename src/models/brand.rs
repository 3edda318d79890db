//! Model brands
use validator::Validate;

use models::BrandId;

use schema::brands;

/// DB presenting by brand
#[derive(Debug, Serialize, Deserialize, Queryable, Clone, Identifiable)]
#[table_name = "brands"]
pub struct Brand {
    pub id: BrandId,
    pub name: String,
}

/// Payload for creating brand
#[derive(Serialize, Deserialize, Insertable, Clone, Validate, Debug)]
#[table_name = "brands"]
pub struct NewBrand {
    #[validate(length(min = "1", max = "255"))]
    pub name: String,
}
