//! Model code usages - one row per redemption of a discount code by a
//! user. Rows are append-only; the `(discount_code_id, user_id)` pair is
//! unique and the primary key is derived from it, so a second redemption
//! attempt collides no matter which constraint fires first.
use std::time::SystemTime;

use hex;
use sha2::{Digest, Sha256};

use models::{CodeUsageId, DiscountCodeId, UserId};

use schema::code_usages;

/// DB presenting by code usage
#[derive(Debug, Serialize, Deserialize, Associations, Queryable, Clone, Identifiable)]
#[table_name = "code_usages"]
pub struct CodeUsage {
    pub id: CodeUsageId,
    pub discount_code_id: DiscountCodeId,
    pub user_id: UserId,
    pub used_at: SystemTime,
}

/// Payload for creating code usage. `id` is recomputed by the repo before
/// insert, whatever the caller put there; `used_at` is stamped by the
/// database at commit.
#[derive(Serialize, Deserialize, Insertable, Clone, Debug)]
#[table_name = "code_usages"]
pub struct NewCodeUsage {
    #[serde(default)]
    pub id: CodeUsageId,
    pub discount_code_id: DiscountCodeId,
    pub user_id: UserId,
}

impl CodeUsageId {
    /// Stable identifier of a `(code, user)` pair. The derivation must not
    /// depend on process state: the same pair has to produce the same id
    /// in every run for the single-use constraint to hold.
    pub fn derive(code: &DiscountCodeId, user: UserId) -> Self {
        let mut hasher = Sha256::new();
        hasher.input(code.0.as_bytes());
        hasher.input(b":");
        hasher.input(user.to_string().as_bytes());
        CodeUsageId(hex::encode(hasher.result()))
    }
}
