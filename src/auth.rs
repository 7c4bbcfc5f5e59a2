//! Operator identity at the edge of the core.
//!
//! Token verification and role storage belong to an external identity
//! provider; the core only consumes these two traits. `StaticOperators`
//! backs them with the config's operator table for the bundled binary.

use crate::config::OperatorEntry;
use crate::error::{FleetError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::{debug, warn};

pub const ADMIN_ROLE: &str = "admin";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub uid: String,
    pub email: String,
}

/// An authenticated admin; its email is what the audit log records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub uid: String,
    pub email: String,
}

impl Actor {
    pub fn audit_name(&self) -> &str {
        &self.email
    }
}

#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity>;
}

#[async_trait]
pub trait RoleLookup: Send + Sync {
    async fn role_of(&self, uid: &str) -> Result<Option<String>>;
}

/// Bearer token → admin actor, or `Unauthorized` / `Forbidden`.
pub async fn authorize_admin(
    token: Option<&str>,
    verifier: &dyn IdentityVerifier,
    roles: &dyn RoleLookup,
) -> Result<Actor> {
    let token = token
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| FleetError::Unauthorized("no token provided".to_string()))?;

    let identity = verifier.verify(token).await?;
    match roles.role_of(&identity.uid).await? {
        Some(role) if role == ADMIN_ROLE => {
            debug!(uid = %identity.uid, "admin authorized");
            Ok(Actor {
                uid: identity.uid,
                email: identity.email,
            })
        }
        other => {
            warn!(uid = %identity.uid, role = ?other, "non-admin access attempt");
            Err(FleetError::Forbidden("admin role required".to_string()))
        }
    }
}

#[derive(Debug, Default)]
pub struct StaticOperators {
    by_token: HashMap<String, OperatorEntry>,
}

impl StaticOperators {
    pub fn new(entries: &[OperatorEntry]) -> Self {
        Self {
            by_token: entries
                .iter()
                .map(|entry| (entry.token.clone(), entry.clone()))
                .collect(),
        }
    }
}

#[async_trait]
impl IdentityVerifier for StaticOperators {
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity> {
        self.by_token
            .get(token)
            .map(|entry| VerifiedIdentity {
                uid: entry.uid.clone(),
                email: entry.email.clone(),
            })
            .ok_or_else(|| FleetError::Unauthorized("invalid token".to_string()))
    }
}

#[async_trait]
impl RoleLookup for StaticOperators {
    async fn role_of(&self, uid: &str) -> Result<Option<String>> {
        Ok(self
            .by_token
            .values()
            .find(|entry| entry.uid == uid)
            .and_then(|entry| entry.role.clone()))
    }
}
