//! Per-entity capability map derived from the roles of the current user.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::domain::auth::{AuthenticatedUser, check_role};
use crate::{SERVICE_ACCESS_ROLE, SERVICE_ADMIN_ROLE, SERVICE_EDITOR_ROLE};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionEntity {
    Contact,
    Communication,
    Resource,
    Event,
    ExtractionQuery,
    Report,
    ApiUsage,
}

impl PermissionEntity {
    pub const ALL: [PermissionEntity; 7] = [
        PermissionEntity::Contact,
        PermissionEntity::Communication,
        PermissionEntity::Resource,
        PermissionEntity::Event,
        PermissionEntity::ExtractionQuery,
        PermissionEntity::Report,
        PermissionEntity::ApiUsage,
    ];

    /// Capabilities that have a meaning for this entity.
    pub fn capabilities(self) -> &'static [Capability] {
        use Capability::*;
        match self {
            PermissionEntity::Contact | PermissionEntity::Event => &[Add, Change, Delete, Export],
            PermissionEntity::Communication | PermissionEntity::Resource => &[Add, Change, Delete],
            PermissionEntity::ExtractionQuery => &[Add, Delete],
            PermissionEntity::Report => &[Add, Change, Delete, SignOff],
            PermissionEntity::ApiUsage => &[Export],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Add,
    Change,
    Delete,
    Export,
    SignOff,
}

/// Capability flags of one entity, shaped for templates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CapabilityFlags {
    pub add: bool,
    pub change: bool,
    pub delete: bool,
    pub export: bool,
    pub sign_off: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Permissions {
    view: bool,
    granted: BTreeSet<(PermissionEntity, Capability)>,
}

impl Permissions {
    /// No access at all.
    pub fn none() -> Self {
        Self::default()
    }

    /// Read-only access to every list.
    pub fn viewer() -> Self {
        Self {
            view: true,
            ..Self::default()
        }
    }

    /// Every capability on every entity.
    pub fn all() -> Self {
        PermissionEntity::ALL
            .iter()
            .flat_map(|entity| entity.capabilities().iter().map(move |cap| (*entity, *cap)))
            .fold(Self::viewer(), |acc, (entity, cap)| acc.grant(entity, cap))
    }

    /// `helix` reads, `helix_editor` additionally edits and exports,
    /// `helix_admin` may do everything including signing off reports.
    pub fn for_roles(roles: &[String]) -> Self {
        if check_role(SERVICE_ADMIN_ROLE, roles) {
            return Self::all();
        }
        if check_role(SERVICE_EDITOR_ROLE, roles) {
            return PermissionEntity::ALL
                .iter()
                .filter(|entity| **entity != PermissionEntity::ApiUsage)
                .flat_map(|entity| entity.capabilities().iter().map(move |cap| (*entity, *cap)))
                .filter(|(_, cap)| *cap != Capability::SignOff)
                .fold(Self::viewer(), |acc, (entity, cap)| acc.grant(entity, cap));
        }
        if check_role(SERVICE_ACCESS_ROLE, roles) {
            return Self::viewer();
        }
        Self::none()
    }

    pub fn for_user(user: &AuthenticatedUser) -> Self {
        Self::for_roles(&user.roles)
    }

    pub fn grant(mut self, entity: PermissionEntity, capability: Capability) -> Self {
        self.view = true;
        self.granted.insert((entity, capability));
        self
    }

    pub fn can_view(&self) -> bool {
        self.view
    }

    pub fn allows(&self, entity: PermissionEntity, capability: Capability) -> bool {
        self.granted.contains(&(entity, capability))
    }

    pub fn flags(&self, entity: PermissionEntity) -> CapabilityFlags {
        CapabilityFlags {
            add: self.allows(entity, Capability::Add),
            change: self.allows(entity, Capability::Change),
            delete: self.allows(entity, Capability::Delete),
            export: self.allows(entity, Capability::Export),
            sign_off: self.allows(entity, Capability::SignOff),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roles(names: &[&str]) -> Vec<String> {
        names.iter().map(|r| r.to_string()).collect()
    }

    #[test]
    fn viewer_cannot_change_anything() {
        let permissions = Permissions::for_roles(&roles(&["helix"]));

        assert!(permissions.can_view());
        for entity in PermissionEntity::ALL {
            assert_eq!(permissions.flags(entity), CapabilityFlags::default());
        }
    }

    #[test]
    fn editor_edits_but_does_not_sign_off() {
        let permissions = Permissions::for_roles(&roles(&["helix", "helix_editor"]));

        assert!(permissions.allows(PermissionEntity::Contact, Capability::Delete));
        assert!(permissions.allows(PermissionEntity::Event, Capability::Export));
        assert!(!permissions.allows(PermissionEntity::Report, Capability::SignOff));
        assert!(!permissions.allows(PermissionEntity::ApiUsage, Capability::Export));
    }

    #[test]
    fn admin_gets_only_meaningful_capabilities() {
        let permissions = Permissions::for_roles(&roles(&["helix_admin"]));

        assert!(permissions.allows(PermissionEntity::Report, Capability::SignOff));
        assert!(permissions.allows(PermissionEntity::ApiUsage, Capability::Export));
        assert!(!permissions.allows(PermissionEntity::ApiUsage, Capability::Add));
        assert!(!permissions.allows(PermissionEntity::ExtractionQuery, Capability::Change));
    }

    #[test]
    fn unknown_roles_get_nothing() {
        let permissions = Permissions::for_roles(&roles(&["crm"]));

        assert!(!permissions.can_view());
        assert_eq!(permissions, Permissions::none());
    }
}
