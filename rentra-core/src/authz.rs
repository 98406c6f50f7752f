use serde::{Deserialize, Serialize};

/// Role carried in the bearer credential's claims. Token issuance lives
/// with the external identity provider; this crate only consumes the
/// resulting role.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Customer,
    Manager,
    Admin,
}

/// Capabilities checked by mutating operations. Every call site goes
/// through [`AuthContext::require`] instead of comparing role strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    ManageFleet,
    OperateBookings,
    AssessFines,
    SettleDeposits,
    ViewReports,
}

impl Role {
    pub fn permits(self, permission: Permission) -> bool {
        match self {
            Role::Admin | Role::Manager => true,
            Role::Customer => match permission {
                Permission::ManageFleet
                | Permission::OperateBookings
                | Permission::AssessFines
                | Permission::SettleDeposits
                | Permission::ViewReports => false,
            },
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Permission::ManageFleet => "manage_fleet",
            Permission::OperateBookings => "operate_bookings",
            Permission::AssessFines => "assess_fines",
            Permission::SettleDeposits => "settle_deposits",
            Permission::ViewReports => "view_reports",
        };
        f.write_str(name)
    }
}

/// Authenticated identity extracted from a validated bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthContext {
    /// Subject claim, used as the customer reference on bookings.
    pub subject: String,
    pub role: Role,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("role {role:?} lacks permission {permission}")]
pub struct Forbidden {
    pub role: Role,
    pub permission: Permission,
}

impl AuthContext {
    pub fn new(subject: impl Into<String>, role: Role) -> Self {
        Self {
            subject: subject.into(),
            role,
        }
    }

    pub fn require(&self, permission: Permission) -> Result<(), Forbidden> {
        if self.role.permits(permission) {
            Ok(())
        } else {
            Err(Forbidden {
                role: self.role,
                permission,
            })
        }
    }

    /// True when this identity is the referenced customer. Cancellation
    /// and invoice payment allow the owning customer as well as staff.
    pub fn is_subject(&self, customer_ref: &str) -> bool {
        self.subject == customer_ref
    }
}
