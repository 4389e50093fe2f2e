use std::fmt;

use serde::{Deserialize, Serialize};

/// Account role. Persisted in the `role` column as the variant name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Employer,
    Applicant,
}

impl Role {
    pub const ALL: &'static [Role] = &[Role::Admin, Role::Employer, Role::Applicant];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Employer => "Employer",
            Role::Applicant => "Applicant",
        }
    }

    pub fn parse(value: &str) -> Option<Role> {
        match value {
            "Admin" => Some(Role::Admin),
            "Employer" => Some(Role::Employer),
            "Applicant" => Some(Role::Applicant),
            _ => None,
        }
    }

    /// Roles an account may pick at sign-up. Admin accounts are provisioned
    /// out of band.
    pub fn is_registerable(&self) -> bool {
        matches!(self, Role::Employer | Role::Applicant)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_strings_round_trip() {
        for role in Role::ALL {
            assert_eq!(Role::parse(role.as_str()), Some(*role));
        }
        assert_eq!(Role::parse("admin"), None);
        assert_eq!(Role::parse("Moderator"), None);
    }

    #[test]
    fn admin_cannot_self_register() {
        assert!(!Role::Admin.is_registerable());
        assert!(Role::Employer.is_registerable());
        assert!(Role::Applicant.is_registerable());
    }
}
