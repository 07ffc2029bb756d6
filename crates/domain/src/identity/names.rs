/// Every permission the application knows about.
pub struct PermissionNames;

impl PermissionNames {
    pub const ORDERS_VIEW: &'static str = "Orders_View";
    pub const ORDERS_CREATE: &'static str = "Orders_Create";
    pub const ORDERS_EDIT: &'static str = "Orders_Edit";
    pub const ORDERS_CANCEL: &'static str = "Orders_Cancel";
    pub const PRODUCTS_VIEW: &'static str = "Products_View";
    pub const PRODUCTS_CREATE: &'static str = "Products_Create";
    pub const PRODUCTS_DELETE: &'static str = "Products_Delete";
    pub const USERS_VIEW: &'static str = "Users_View";
    pub const USERS_MANAGE: &'static str = "Users_Manage";
    pub const ROLES_VIEW: &'static str = "Roles_View";
    pub const ROLES_MANAGE: &'static str = "Roles_Manage";

    /// All names, in declaration order.
    pub const NAME_LIST: &'static [&'static str] = &[
        Self::ORDERS_VIEW,
        Self::ORDERS_CREATE,
        Self::ORDERS_EDIT,
        Self::ORDERS_CANCEL,
        Self::PRODUCTS_VIEW,
        Self::PRODUCTS_CREATE,
        Self::PRODUCTS_DELETE,
        Self::USERS_VIEW,
        Self::USERS_MANAGE,
        Self::ROLES_VIEW,
        Self::ROLES_MANAGE,
    ];

    pub fn contains(name: &str) -> bool {
        Self::NAME_LIST.contains(&name)
    }
}

/// Built-in role names.
pub struct RoleNames;

impl RoleNames {
    pub const ADMINISTRATORS: &'static str = "Administrators";
}
