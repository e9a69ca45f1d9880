use serde::{Deserialize, Serialize};
use std::fmt;

/// Authorization scope of an account.
///
/// Roles are distinct rather than ordered: each guarded operation names
/// the one role allowed to perform it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[repr(i16)]
pub enum UserRole {
    #[default]
    User = 0,
    Moderator = 1,
    LocalAdmin = 2,
}

impl UserRole {
    #[inline]
    pub const fn id(&self) -> i16 {
        *self as i16
    }

    #[inline]
    pub const fn code(&self) -> &'static str {
        use UserRole::*;
        match self {
            User => "user",
            Moderator => "moderator",
            LocalAdmin => "local-admin",
        }
    }

    #[inline]
    pub fn from_id(id: i16) -> Option<Self> {
        use UserRole::*;
        match id {
            0 => Some(User),
            1 => Some(Moderator),
            2 => Some(LocalAdmin),
            _ => None,
        }
    }

    #[inline]
    pub fn from_code(code: &str) -> Option<Self> {
        use UserRole::*;
        match code {
            "user" => Some(User),
            "moderator" => Some(Moderator),
            "local-admin" => Some(LocalAdmin),
            _ => None,
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_role_from_id() {
        assert_eq!(UserRole::from_id(0), Some(UserRole::User));
        assert_eq!(UserRole::from_id(1), Some(UserRole::Moderator));
        assert_eq!(UserRole::from_id(2), Some(UserRole::LocalAdmin));
        assert_eq!(UserRole::from_id(3), None);
    }

    #[test]
    fn test_user_role_codes_roundtrip() {
        for role in [UserRole::User, UserRole::Moderator, UserRole::LocalAdmin] {
            assert_eq!(UserRole::from_code(role.code()), Some(role));
            assert_eq!(UserRole::from_id(role.id()), Some(role));
        }
        assert_eq!(UserRole::from_code("admin"), None);
    }

    #[test]
    fn test_user_role_serde_matches_code() {
        let json = serde_json::to_string(&UserRole::LocalAdmin).unwrap();
        assert_eq!(json, "\"local-admin\"");
        assert_eq!(UserRole::LocalAdmin.to_string(), "local-admin");
    }
}
