//! RolesCache is a module that caches roles derived from the users table
//! so the ACL does not go back to the db on every request.
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use models::{Role, UserId};

#[derive(Clone, Default)]
pub struct RolesCacheImpl {
    roles_cache: Arc<Mutex<HashMap<UserId, Vec<Role>>>>,
}

impl RolesCacheImpl {
    pub fn contains(&self, user_id: UserId) -> bool {
        let hash_map = self.roles_cache.lock().unwrap();
        hash_map.contains_key(&user_id)
    }

    pub fn get(&self, user_id: UserId) -> Vec<Role> {
        let hash_map = self.roles_cache.lock().unwrap();
        hash_map.get(&user_id).cloned().unwrap_or_default()
    }

    pub fn add_roles(&self, user_id: UserId, roles: &[Role]) {
        let mut hash_map = self.roles_cache.lock().unwrap();
        hash_map.insert(user_id, roles.to_vec());
    }

    pub fn remove(&self, user_id: UserId) {
        let mut hash_map = self.roles_cache.lock().unwrap();
        hash_map.remove(&user_id);
    }

    pub fn clear(&self) {
        let mut hash_map = self.roles_cache.lock().unwrap();
        hash_map.clear();
    }
}
