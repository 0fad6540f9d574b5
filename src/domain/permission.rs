use std::fmt;
use std::str::FromStr;

/// Capabilities a permission row can grant on a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Add,
    Update,
    Delete,
    Select,
    Special,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Action::Add => "add",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::Select => "select",
            Action::Special => "special",
        };
        f.write_str(s)
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add" => Ok(Action::Add),
            "update" => Ok(Action::Update),
            "delete" => Ok(Action::Delete),
            "select" => Ok(Action::Select),
            "special" => Ok(Action::Special),
            other => Err(format!("unknown permission action: {}", other)),
        }
    }
}

/// Authorization row scoping a user to a resource
///
/// Read-only in the request-serving path; rows are seeded out of band.
#[derive(Debug, Clone)]
pub struct UserPermission {
    pub id: i64,
    pub user_id: i64,
    pub resource: String,
    pub can_add: bool,
    pub can_update: bool,
    pub can_delete: bool,
    pub can_select: bool,
    pub can_special: bool,
}

impl UserPermission {
    /// Resolves whether this row grants the given action.
    pub fn allows(&self, action: Action) -> bool {
        match action {
            Action::Add => self.can_add,
            Action::Update => self.can_update,
            Action::Delete => self.can_delete,
            Action::Select => self.can_select,
            Action::Special => self.can_special,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> UserPermission {
        UserPermission {
            id: 1,
            user_id: 42,
            resource: "users".to_string(),
            can_add: true,
            can_update: false,
            can_delete: false,
            can_select: true,
            can_special: false,
        }
    }

    #[test]
    fn allows_maps_each_action_to_its_flag() {
        let perm = row();
        assert!(perm.allows(Action::Add));
        assert!(perm.allows(Action::Select));
        assert!(!perm.allows(Action::Update));
        assert!(!perm.allows(Action::Delete));
        assert!(!perm.allows(Action::Special));
    }

    #[test]
    fn action_parses_from_text() {
        assert_eq!("select".parse::<Action>().unwrap(), Action::Select);
        assert!("read".parse::<Action>().is_err());
    }
}
