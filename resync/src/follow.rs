//! Hypertext traversal policy

use serde::{Deserialize, Serialize};

use crate::error::{Result, SyncError};

/// Relation naming a resource's own URI; never traversed
pub const SELF_RELATION: &str = "self";

/// Prefix marking links to owned (child) resources
pub const CHILD_PREFIX: &str = "child:";

const PAGE_RELATIONS: &[&str] = &["next", "prev"];

/// Which link relations the crawler follows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FollowMode {
    /// Only the origin document and its embedded items
    #[default]
    None,
    /// Pagination links
    Page,
    /// Pagination and `child:*` links
    Child,
    /// Every link except `self`
    All,
}

impl FollowMode {
    pub fn follows(&self, relation: &str) -> bool {
        if relation == SELF_RELATION {
            return false;
        }

        let is_page = PAGE_RELATIONS.contains(&relation);
        let is_child = relation.starts_with(CHILD_PREFIX);

        match self {
            FollowMode::None => false,
            FollowMode::Page => is_page,
            FollowMode::Child => is_page || is_child,
            FollowMode::All => true,
        }
    }
}

impl std::fmt::Display for FollowMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FollowMode::None => write!(f, "none"),
            FollowMode::Page => write!(f, "page"),
            FollowMode::Child => write!(f, "child"),
            FollowMode::All => write!(f, "all"),
        }
    }
}

impl std::str::FromStr for FollowMode {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(FollowMode::None),
            "page" => Ok(FollowMode::Page),
            "child" => Ok(FollowMode::Child),
            "all" => Ok(FollowMode::All),
            other => Err(SyncError::config(format!("Unknown follow mode: {other}"))),
        }
    }
}
