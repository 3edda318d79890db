//! Scope enum for authorization
use std::fmt;

// All - resources of all users, Owned - only resources the acting user owns.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Scope {
    All,
    Owned,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Scope::All => write!(f, "all"),
            Scope::Owned => write!(f, "owned"),
        }
    }
}
