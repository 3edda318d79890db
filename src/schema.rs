/// diesel table for brands
table! {
    brands (id) {
        id -> Integer,
        name -> VarChar,
    }
}

/// diesel table for users
table! {
    users (id) {
        id -> Integer,
        username -> VarChar,
        is_staff -> Bool,
        is_brand -> Bool,
        brand_id -> Nullable<Integer>,
    }
}

/// diesel table for discount_rules
table! {
    discount_rules (id) {
        id -> Integer,
        brand_id -> Integer,
        discount -> Integer,
    }
}

/// diesel table for discount_codes
table! {
    discount_codes (id) {
        id -> VarChar,
        rule_id -> Integer,
        valid_until -> Date,
    }
}

/// diesel table for code_usages.
/// `(discount_code_id, user_id)` carries a unique constraint in addition
/// to the derived primary key.
table! {
    code_usages (id) {
        id -> VarChar,
        discount_code_id -> VarChar,
        user_id -> Integer,
        used_at -> Timestamp, // UTC 0, generated at db level
    }
}

joinable!(discount_rules -> brands (brand_id));
joinable!(discount_codes -> discount_rules (rule_id));
joinable!(code_usages -> discount_codes (discount_code_id));
joinable!(code_usages -> users (user_id));

allow_tables_to_appear_in_same_query!(brands, users, discount_rules, discount_codes, code_usages);
