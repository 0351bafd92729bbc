use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AuthError, AuthResult};

/// Stored account role. `Unset` covers users registered without one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountRole {
    Buyer,
    Seller,
    #[default]
    Unset,
}

impl AccountRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountRole::Buyer => "buyer",
            AccountRole::Seller => "seller",
            AccountRole::Unset => "unset",
        }
    }
}

impl fmt::Display for AccountRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role '{}'", self.0)
    }
}

impl std::error::Error for UnknownRole {}

impl FromStr for AccountRole {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buyer" => Ok(AccountRole::Buyer),
            "seller" => Ok(AccountRole::Seller),
            "" | "unset" => Ok(AccountRole::Unset),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// What a stored user is allowed to do: their role plus the orthogonal
/// admin flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grants {
    pub role: AccountRole,
    pub is_admin: bool,
}

/// Requirement checked by a role gate or a role lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleRequirement {
    Admin,
    Seller,
    Buyer,
}

impl RoleRequirement {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleRequirement::Admin => "admin",
            RoleRequirement::Seller => "seller",
            RoleRequirement::Buyer => "buyer",
        }
    }
}

impl Grants {
    pub fn satisfies(&self, required: RoleRequirement) -> bool {
        match required {
            RoleRequirement::Admin => self.is_admin,
            RoleRequirement::Seller => matches!(self.role, AccountRole::Seller),
            RoleRequirement::Buyer => matches!(self.role, AccountRole::Buyer),
        }
    }
}

/// Decide a role gate. A missing user never passes.
pub fn authorize(grants: Option<Grants>, required: RoleRequirement) -> AuthResult<()> {
    match grants {
        Some(grants) if grants.satisfies(required) => Ok(()),
        _ => Err(AuthError::Forbidden(required.as_str())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grants(role: AccountRole, is_admin: bool) -> Option<Grants> {
        Some(Grants { role, is_admin })
    }

    #[test]
    fn seller_gate_matrix() {
        assert!(authorize(grants(AccountRole::Seller, false), RoleRequirement::Seller).is_ok());
        assert!(authorize(grants(AccountRole::Buyer, false), RoleRequirement::Seller).is_err());
        assert!(authorize(grants(AccountRole::Unset, true), RoleRequirement::Seller).is_err());
        assert!(authorize(None, RoleRequirement::Seller).is_err());
    }

    #[test]
    fn admin_flag_is_orthogonal_to_role() {
        assert!(authorize(grants(AccountRole::Buyer, true), RoleRequirement::Admin).is_ok());
        assert!(authorize(grants(AccountRole::Seller, true), RoleRequirement::Admin).is_ok());
        assert!(authorize(grants(AccountRole::Seller, false), RoleRequirement::Admin).is_err());
    }

    #[test]
    fn failure_names_the_requirement() {
        let err = authorize(grants(AccountRole::Buyer, false), RoleRequirement::Admin)
            .expect_err("buyer is not admin");
        assert!(matches!(err, AuthError::Forbidden("admin")));
    }

    #[test]
    fn role_parsing() {
        assert_eq!("seller".parse::<AccountRole>(), Ok(AccountRole::Seller));
        assert_eq!("".parse::<AccountRole>(), Ok(AccountRole::Unset));
        assert!("Seller".parse::<AccountRole>().is_err());
    }

    #[test]
    fn role_serde_is_lowercase() {
        let json = serde_json::to_string(&AccountRole::Buyer).expect("serialize");
        assert_eq!(json, "\"buyer\"");
        let parsed: AccountRole = serde_json::from_str("\"unset\"").expect("deserialize");
        assert_eq!(parsed, AccountRole::Unset);
    }
}
