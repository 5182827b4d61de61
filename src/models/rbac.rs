// src/models/rbac.rs

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use utoipa::ToSchema;

// --- PAPÉIS ---

// Mapeia o CREATE TYPE user_role do banco
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    Sales,
    Support,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Admin, Role::Manager, Role::Sales, Role::Support];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Sales => "sales",
            Role::Support => "support",
        }
    }

    /// Papéis cujas exigências este papel satisfaz (ele mesmo incluso).
    pub fn hierarchy(self) -> &'static [Role] {
        match self {
            Role::Admin => &[Role::Admin, Role::Manager, Role::Sales, Role::Support],
            Role::Manager => &[Role::Manager, Role::Sales, Role::Support],
            Role::Sales => &[Role::Sales, Role::Support],
            Role::Support => &[Role::Support],
        }
    }

    pub fn has_role_access(self, required: Role) -> bool {
        self.hierarchy().contains(&required)
    }

    /// Aceita uma lista separada por vírgulas ("manager,admin").
    /// Basta um item ser satisfeito pela hierarquia. Nomes desconhecidos nunca liberam acesso.
    pub fn satisfies_any(self, required: &str) -> bool {
        required
            .split(',')
            .filter_map(|name| name.trim().parse::<Role>().ok())
            .any(|r| self.has_role_access(r))
    }

    /// O conjunto fixo de permissões do papel.
    pub fn permissions(self) -> &'static [Permission] {
        use Permission::*;
        match self {
            Role::Admin => Permission::ALL,
            Role::Manager => &[
                LeadsView, LeadsCreate, LeadsEdit, LeadsAssign, LeadsConvert, LeadsDelete,
                ProductsView, ProductsCreate, ProductsEdit, ProductsDelete,
                ProjectsView, ProjectsCreate, ProjectsEdit, ProjectsSubmit, ProjectsApprove,
                ProjectsComplete, ProjectsDelete,
                CustomersView, CustomersCreate, CustomersEdit, CustomersDelete,
                ServicesView, ServicesCreate, ServicesEdit, ServicesDelete,
                TicketsView, TicketsEdit, TicketsDelete,
                UsersView,
                ReportsView,
            ],
            Role::Sales => &[
                LeadsView, LeadsCreate, LeadsEdit, LeadsConvert,
                ProductsView,
                ProjectsView, ProjectsCreate, ProjectsEdit, ProjectsSubmit, ProjectsComplete,
                CustomersView, CustomersCreate, CustomersEdit,
                ServicesView, ServicesCreate,
                ReportsView,
            ],
            Role::Support => &[
                LeadsView,
                ProductsView,
                ProjectsView,
                CustomersView,
                ServicesView, ServicesEdit,
                TicketsView, TicketsEdit,
                ReportsView,
            ],
        }
    }

    pub fn has_permission(self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "sales" => Ok(Role::Sales),
            "support" => Ok(Role::Support),
            _ => Err(()),
        }
    }
}

// --- PERMISSÕES ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
pub enum Permission {
    #[serde(rename = "leads.view")] LeadsView,
    #[serde(rename = "leads.create")] LeadsCreate,
    #[serde(rename = "leads.edit")] LeadsEdit,
    #[serde(rename = "leads.assign")] LeadsAssign,
    #[serde(rename = "leads.convert")] LeadsConvert,
    #[serde(rename = "leads.delete")] LeadsDelete,
    #[serde(rename = "products.view")] ProductsView,
    #[serde(rename = "products.create")] ProductsCreate,
    #[serde(rename = "products.edit")] ProductsEdit,
    #[serde(rename = "products.delete")] ProductsDelete,
    #[serde(rename = "projects.view")] ProjectsView,
    #[serde(rename = "projects.create")] ProjectsCreate,
    #[serde(rename = "projects.edit")] ProjectsEdit,
    #[serde(rename = "projects.submit")] ProjectsSubmit,
    #[serde(rename = "projects.approve")] ProjectsApprove,
    #[serde(rename = "projects.complete")] ProjectsComplete,
    #[serde(rename = "projects.delete")] ProjectsDelete,
    #[serde(rename = "customers.view")] CustomersView,
    #[serde(rename = "customers.create")] CustomersCreate,
    #[serde(rename = "customers.edit")] CustomersEdit,
    #[serde(rename = "customers.delete")] CustomersDelete,
    #[serde(rename = "services.view")] ServicesView,
    #[serde(rename = "services.create")] ServicesCreate,
    #[serde(rename = "services.edit")] ServicesEdit,
    #[serde(rename = "services.delete")] ServicesDelete,
    #[serde(rename = "tickets.view")] TicketsView,
    #[serde(rename = "tickets.edit")] TicketsEdit,
    #[serde(rename = "tickets.delete")] TicketsDelete,
    #[serde(rename = "users.view")] UsersView,
    #[serde(rename = "users.create")] UsersCreate,
    #[serde(rename = "users.edit")] UsersEdit,
    #[serde(rename = "users.delete")] UsersDelete,
    #[serde(rename = "reports.view")] ReportsView,
}

impl Permission {
    pub const ALL: &'static [Permission] = &[
        Permission::LeadsView, Permission::LeadsCreate, Permission::LeadsEdit,
        Permission::LeadsAssign, Permission::LeadsConvert, Permission::LeadsDelete,
        Permission::ProductsView, Permission::ProductsCreate, Permission::ProductsEdit,
        Permission::ProductsDelete,
        Permission::ProjectsView, Permission::ProjectsCreate, Permission::ProjectsEdit,
        Permission::ProjectsSubmit, Permission::ProjectsApprove, Permission::ProjectsComplete,
        Permission::ProjectsDelete,
        Permission::CustomersView, Permission::CustomersCreate, Permission::CustomersEdit,
        Permission::CustomersDelete,
        Permission::ServicesView, Permission::ServicesCreate, Permission::ServicesEdit,
        Permission::ServicesDelete,
        Permission::TicketsView, Permission::TicketsEdit, Permission::TicketsDelete,
        Permission::UsersView, Permission::UsersCreate, Permission::UsersEdit,
        Permission::UsersDelete,
        Permission::ReportsView,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            Permission::LeadsView => "leads.view",
            Permission::LeadsCreate => "leads.create",
            Permission::LeadsEdit => "leads.edit",
            Permission::LeadsAssign => "leads.assign",
            Permission::LeadsConvert => "leads.convert",
            Permission::LeadsDelete => "leads.delete",
            Permission::ProductsView => "products.view",
            Permission::ProductsCreate => "products.create",
            Permission::ProductsEdit => "products.edit",
            Permission::ProductsDelete => "products.delete",
            Permission::ProjectsView => "projects.view",
            Permission::ProjectsCreate => "projects.create",
            Permission::ProjectsEdit => "projects.edit",
            Permission::ProjectsSubmit => "projects.submit",
            Permission::ProjectsApprove => "projects.approve",
            Permission::ProjectsComplete => "projects.complete",
            Permission::ProjectsDelete => "projects.delete",
            Permission::CustomersView => "customers.view",
            Permission::CustomersCreate => "customers.create",
            Permission::CustomersEdit => "customers.edit",
            Permission::CustomersDelete => "customers.delete",
            Permission::ServicesView => "services.view",
            Permission::ServicesCreate => "services.create",
            Permission::ServicesEdit => "services.edit",
            Permission::ServicesDelete => "services.delete",
            Permission::TicketsView => "tickets.view",
            Permission::TicketsEdit => "tickets.edit",
            Permission::TicketsDelete => "tickets.delete",
            Permission::UsersView => "users.view",
            Permission::UsersCreate => "users.create",
            Permission::UsersEdit => "users.edit",
            Permission::UsersDelete => "users.delete",
            Permission::ReportsView => "reports.view",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

// Resposta do GET /auth/me/permissions
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RolePermissionsResponse {
    pub role: Role,
    pub permissions: Vec<Permission>,
    pub satisfies_roles: Vec<Role>,
}

impl From<Role> for RolePermissionsResponse {
    fn from(role: Role) -> Self {
        Self {
            role,
            permissions: role.permissions().to_vec(),
            satisfies_roles: role.hierarchy().to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_has_every_permission() {
        for p in Permission::ALL {
            assert!(Role::Admin.has_permission(*p), "admin sem {}", p);
        }
    }

    #[test]
    fn sales_cannot_delete_or_approve() {
        for p in Permission::ALL {
            if p.slug().ends_with(".delete") {
                assert!(!Role::Sales.has_permission(*p), "sales com {}", p);
            }
        }
        assert!(!Role::Sales.has_permission(Permission::ProjectsApprove));
        assert!(Role::Sales.has_permission(Permission::ProjectsSubmit));
        assert!(Role::Sales.has_permission(Permission::ProjectsComplete));
    }

    #[test]
    fn support_is_limited_to_tickets_and_services() {
        assert!(Role::Support.has_permission(Permission::TicketsEdit));
        assert!(Role::Support.has_permission(Permission::ServicesEdit));
        assert!(!Role::Support.has_permission(Permission::LeadsCreate));
        assert!(!Role::Support.has_permission(Permission::ProjectsSubmit));
        assert!(!Role::Support.has_permission(Permission::UsersView));
    }

    #[test]
    fn only_admin_manages_users() {
        for role in Role::ALL {
            let expected = role == Role::Admin;
            assert_eq!(role.has_permission(Permission::UsersCreate), expected);
            assert_eq!(role.has_permission(Permission::UsersDelete), expected);
        }
    }

    #[test]
    fn permission_sets_are_subsets_of_admin_and_have_no_duplicates() {
        for role in Role::ALL {
            let perms = role.permissions();
            for (i, p) in perms.iter().enumerate() {
                assert!(Permission::ALL.contains(p));
                assert!(!perms[i + 1..].contains(p), "{} duplicada em {}", p, role);
            }
        }
    }

    #[test]
    fn hierarchy_matches_table() {
        let expected = [
            (Role::Admin, vec![Role::Admin, Role::Manager, Role::Sales, Role::Support]),
            (Role::Manager, vec![Role::Manager, Role::Sales, Role::Support]),
            (Role::Sales, vec![Role::Sales, Role::Support]),
            (Role::Support, vec![Role::Support]),
        ];
        for (role, grants) in expected {
            for required in Role::ALL {
                assert_eq!(
                    role.has_role_access(required),
                    grants.contains(&required),
                    "{} -> {}",
                    role,
                    required
                );
            }
        }
    }

    #[test]
    fn comma_separated_requirements() {
        assert!(Role::Manager.satisfies_any("manager,admin"));
        assert!(Role::Admin.satisfies_any("manager"));
        assert!(!Role::Sales.satisfies_any("manager,admin"));
        assert!(Role::Sales.satisfies_any("support, manager"));
        assert!(!Role::Support.satisfies_any("sales"));
        assert!(!Role::Admin.satisfies_any("superuser"));
        assert!(!Role::Admin.satisfies_any(""));
    }

    #[test]
    fn role_round_trips_through_str() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>(), Ok(role));
        }
        assert!("Admin".parse::<Role>().is_err());
    }
}
