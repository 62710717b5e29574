//! Per-model role permissions and definition-level guards.

use crate::access::Actor;
use crate::definition::{Action, ModelDefinition, Rbac, Role};
use crate::error::AppError;

/// Outcome of a role/action check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Decision {
    pub allow: bool,
    /// Set when the row's owner column must be compared with the actor before mutating.
    pub requires_ownership_check: bool,
}

impl Decision {
    fn deny() -> Self {
        Decision {
            allow: false,
            requires_ownership_check: false,
        }
    }
}

/// Admin always passes; otherwise the role's grants must contain the action or `all`.
pub fn evaluate(role: Role, action: Action, rbac: &Rbac, owner_field: Option<&str>) -> Decision {
    if role.is_admin() {
        return Decision {
            allow: true,
            requires_ownership_check: false,
        };
    }
    let allow = rbac
        .get(&role)
        .map(|grants| grants.iter().any(|p| p.grants(action)))
        .unwrap_or(false);
    if !allow {
        return Decision::deny();
    }
    Decision {
        allow,
        requires_ownership_check: action.mutates_existing() && owner_field.is_some(),
    }
}

/// `evaluate` that fails with Forbidden on deny.
pub fn authorize(role: Role, action: Action, model: &ModelDefinition) -> Result<Decision, AppError> {
    let decision = evaluate(role, action, &model.definition.rbac, model.owner_field());
    if !decision.allow {
        return Err(AppError::Forbidden(format!(
            "insufficient permissions for {} operation on {}",
            action, model.name
        )));
    }
    Ok(decision)
}

/// Only the creator or an Admin may edit or delete a definition.
pub fn ensure_definition_editor(model: &ModelDefinition, actor: &Actor) -> Result<(), AppError> {
    if actor.role.is_admin() || model.created_by == actor.id {
        return Ok(());
    }
    Err(AppError::Forbidden(format!(
        "only the creator or an Admin may modify model {}",
        model.name
    )))
}

pub fn ensure_can_publish(actor: &Actor) -> Result<(), AppError> {
    match actor.role {
        Role::Admin | Role::Manager => Ok(()),
        Role::Viewer => Err(AppError::Forbidden("publishing requires Admin or Manager".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{DefinitionBody, Permission};
    use chrono::Utc;
    use std::collections::BTreeSet;

    fn rbac(entries: &[(Role, &[Permission])]) -> Rbac {
        entries
            .iter()
            .map(|(r, ps)| (*r, ps.iter().copied().collect::<BTreeSet<_>>()))
            .collect()
    }

    fn model(rbac: Rbac, owner: Option<&str>) -> ModelDefinition {
        ModelDefinition {
            id: 1,
            name: "Task".into(),
            table_name: "tasks".into(),
            definition: DefinitionBody {
                fields: Vec::new(),
                owner_field: owner.map(str::to_string),
                rbac,
            },
            is_published: true,
            created_by: 10,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn allow_iff_granted_or_all_or_admin() {
        let grants = rbac(&[
            (Role::Manager, &[Permission::Create, Permission::Read]),
            (Role::Viewer, &[Permission::All]),
        ]);
        let grant_sets: [(Role, &[Action]); 3] = [
            (Role::Admin, &Action::ALL),
            (Role::Manager, &[Action::Create, Action::Read]),
            (Role::Viewer, &Action::ALL),
        ];
        for (role, allowed) in grant_sets {
            for action in Action::ALL {
                let d = evaluate(role, action, &grants, None);
                assert_eq!(d.allow, allowed.contains(&action), "{role} {action}");
            }
        }
    }

    #[test]
    fn missing_role_means_no_grants() {
        let grants = rbac(&[(Role::Manager, &[Permission::All])]);
        for action in Action::ALL {
            assert!(!evaluate(Role::Viewer, action, &grants, None).allow);
        }
    }

    #[test]
    fn ownership_flag_only_for_mutations_with_owner_field() {
        let grants = rbac(&[(Role::Manager, &[Permission::All])]);
        let owned = |a| evaluate(Role::Manager, a, &grants, Some("ownerId")).requires_ownership_check;
        assert!(owned(Action::Update));
        assert!(owned(Action::Delete));
        assert!(!owned(Action::Read));
        assert!(!owned(Action::Create));
        assert!(!evaluate(Role::Manager, Action::Update, &grants, None).requires_ownership_check);
        assert!(!evaluate(Role::Admin, Action::Update, &grants, Some("ownerId")).requires_ownership_check);
    }

    #[test]
    fn deny_names_action_and_model() {
        let m = model(rbac(&[(Role::Viewer, &[Permission::Read])]), None);
        let err = authorize(Role::Viewer, Action::Create, &m).unwrap_err();
        assert!(matches!(&err, AppError::Forbidden(msg) if msg.contains("create") && msg.contains("Task")));
    }

    #[test]
    fn definition_editors() {
        let m = model(Rbac::new(), None);
        assert!(ensure_definition_editor(&m, &Actor::new(10, Role::Viewer)).is_ok());
        assert!(ensure_definition_editor(&m, &Actor::new(99, Role::Admin)).is_ok());
        assert!(ensure_definition_editor(&m, &Actor::new(99, Role::Manager)).is_err());
        assert!(ensure_can_publish(&Actor::new(1, Role::Manager)).is_ok());
        assert!(ensure_can_publish(&Actor::new(1, Role::Viewer)).is_err());
    }
}
