use crate::domain::user::models::Role;
use crate::domain::user::models::UserId;

/// Identity proven by a verified access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub username: String,
    pub role: Role,
}

/// Whether an operation is further restricted to the resource owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    Any,
    /// Non-admin callers may only act on their own resource.
    OwnerOrAdmin,
}

/// Declares who may invoke one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Permission {
    pub operation: &'static str,
    pub roles: &'static [Role],
    pub ownership: Ownership,
}

impl Permission {
    pub const fn new(
        operation: &'static str,
        roles: &'static [Role],
        ownership: Ownership,
    ) -> Self {
        Self {
            operation,
            roles,
            ownership,
        }
    }

    pub fn allows_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Check an identity that already passed [`Permission::allows_role`] against a resource owner.
    pub fn allows_resource(&self, identity: &Identity, owner: &UserId) -> bool {
        match self.ownership {
            Ownership::Any => true,
            Ownership::OwnerOrAdmin => identity.role == Role::Admin || identity.user_id == *owner,
        }
    }
}

pub static LIST_USERS: Permission = Permission::new("list_users", &[Role::Admin], Ownership::Any);

pub static GET_USER: Permission = Permission::new(
    "get_user",
    &[Role::Admin, Role::User],
    Ownership::OwnerOrAdmin,
);

pub static UPDATE_USER: Permission = Permission::new(
    "update_user",
    &[Role::Admin, Role::User],
    Ownership::OwnerOrAdmin,
);

pub static REMOVE_USER: Permission = Permission::new("remove_user", &[Role::Admin], Ownership::Any);
