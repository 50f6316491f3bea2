use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::auth::Principal;
use crate::model::Record;

/// Abilities checked by the generated endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ability {
    View,
    Delete,
    Restore,
    ForceDelete,
}

impl Ability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Ability::View => "view",
            Ability::Delete => "delete",
            Ability::Restore => "restore",
            Ability::ForceDelete => "forceDelete",
        }
    }
}

impl fmt::Display for Ability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(Option<String>),
}

impl Decision {
    pub fn deny(message: impl Into<String>) -> Self {
        Decision::Deny(Some(message.into()))
    }

    pub fn allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

impl From<bool> for Decision {
    fn from(allowed: bool) -> Self {
        if allowed {
            Decision::Allow
        } else {
            Decision::Deny(None)
        }
    }
}

/// Per-model authorization rules. Abilities a policy does not override are denied.
pub trait Policy: Send + Sync {
    fn view(&self, _principal: Option<&Principal>, _record: &Record) -> Decision {
        Decision::Deny(None)
    }

    fn delete(&self, _principal: Option<&Principal>, _record: &Record) -> Decision {
        Decision::Deny(None)
    }

    fn restore(&self, _principal: Option<&Principal>, _record: &Record) -> Decision {
        Decision::Deny(None)
    }

    fn force_delete(&self, _principal: Option<&Principal>, _record: &Record) -> Decision {
        Decision::Deny(None)
    }

    fn check(&self, ability: Ability, principal: Option<&Principal>, record: &Record) -> Decision {
        match ability {
            Ability::View => self.view(principal, record),
            Ability::Delete => self.delete(principal, record),
            Ability::Restore => self.restore(principal, record),
            Ability::ForceDelete => self.force_delete(principal, record),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthorizationError {
    #[error("Authentication required to {ability} {model}")]
    Unauthenticated { ability: Ability, model: String },

    #[error("This action is unauthorized.")]
    Denied {
        ability: Ability,
        model: String,
        message: Option<String>,
    },
}

/// Model-name to policy registry consulted before every state change
#[derive(Clone, Default)]
pub struct Gate {
    require_authorization: bool,
    policies: HashMap<String, Arc<dyn Policy>>,
}

impl Gate {
    pub fn new(require_authorization: bool) -> Self {
        Self {
            require_authorization,
            policies: HashMap::new(),
        }
    }

    pub fn policy(&mut self, model: impl Into<String>, policy: impl Policy + 'static) -> &mut Self {
        let model = model.into();
        tracing::debug!("Registered policy for model '{}'", model);
        self.policies.insert(model, Arc::new(policy));
        self
    }

    pub fn has_policy(&self, model: &str) -> bool {
        self.policies.contains_key(model)
    }

    pub fn requires_authorization(&self) -> bool {
        self.require_authorization
    }

    pub fn authorize(
        &self,
        principal: Option<&Principal>,
        ability: Ability,
        model: &str,
        record: &Record,
    ) -> Result<(), AuthorizationError> {
        if !self.require_authorization {
            return Ok(());
        }

        if principal.is_none() {
            tracing::warn!("Denied '{}' on {} {}: no authenticated principal", ability, model, record.id);
            return Err(AuthorizationError::Unauthenticated {
                ability,
                model: model.to_string(),
            });
        }

        let Some(policy) = self.policies.get(model) else {
            return Ok(());
        };

        match policy.check(ability, principal, record) {
            Decision::Allow => Ok(()),
            Decision::Deny(message) => {
                tracing::warn!("Policy denied '{}' on {} {}", ability, model, record.id);
                Err(AuthorizationError::Denied {
                    ability,
                    model: model.to_string(),
                    message,
                })
            }
        }
    }
}

impl fmt::Debug for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut models: Vec<&String> = self.policies.keys().collect();
        models.sort();
        f.debug_struct("Gate")
            .field("require_authorization", &self.require_authorization)
            .field("policies", &models)
            .finish()
    }
}
