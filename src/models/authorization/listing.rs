//! Role-based narrowing of list results. Every list endpoint derives a
//! `ListingScope` from the requesting user before the query is built, so
//! out-of-scope rows are never fetched in the first place; the per-row
//! ACL read check still runs on top of it.

use models::{BrandId, User, UserId};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ListingScope {
    All,
    BrandOwned(BrandId),
    UserOwned(UserId),
    Nothing,
}

impl ListingScope {
    /// Scope for catalog resources (discount rules and codes): staff see
    /// everything, brands their own brand, plain users nothing - codes
    /// are only reachable by direct id lookup.
    pub fn for_catalog(requestor: Option<&User>) -> Self {
        match requestor {
            Some(user) if user.is_staff => ListingScope::All,
            Some(user) if user.is_brand => match user.brand_id {
                Some(brand_id) => ListingScope::BrandOwned(brand_id),
                None => ListingScope::Nothing,
            },
            _ => ListingScope::Nothing,
        }
    }

    /// Scope for code usages: staff see everything, brands the usages of
    /// their own brand's codes, plain users their own redemptions.
    pub fn for_usages(requestor: Option<&User>) -> Self {
        match requestor {
            Some(user) if user.is_staff => ListingScope::All,
            Some(user) if user.is_brand => match user.brand_id {
                Some(brand_id) => ListingScope::BrandOwned(brand_id),
                None => ListingScope::Nothing,
            },
            Some(user) => ListingScope::UserOwned(user.id),
            None => ListingScope::Nothing,
        }
    }
}
