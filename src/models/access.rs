// src/models/access.rs
use crate::models::user::{Account, User};

/// Que estudiantes o utilizador pode ver. Resolvido uma vez por pedido.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Encargados e superutilizadores
    All,
    /// Tutor: apenas os estudiantes atribuídos a este perfil
    AssignedTo(i64),
    /// Identidade sem perfil SAT
    Nothing,
}

/// Capacidade do pedido atual: identidade, perfil (se existir) e alcance.
#[derive(Debug, Clone)]
pub struct Access {
    pub account_id: i64,
    pub email: String,
    pub is_superuser: bool,
    pub profile: Option<User>,
    pub scope: Scope,
}

impl Access {
    pub fn resolve(account: &Account, profile: Option<User>) -> Self {
        let scope = match (&profile, account.is_superuser) {
            (_, true) => Scope::All,
            (None, false) => Scope::Nothing,
            (Some(p), false) if p.is_tutor() => Scope::AssignedTo(p.id),
            (Some(_), false) => Scope::All,
        };
        Access {
            account_id: account.id,
            email: account.email.clone(),
            is_superuser: account.is_superuser,
            profile,
            scope,
        }
    }

    pub fn profile_id(&self) -> Option<i64> {
        self.profile.as_ref().map(|p| p.id)
    }

    pub fn display_name(&self) -> String {
        self.profile
            .as_ref()
            .map(|p| p.full_name())
            .unwrap_or_else(|| self.email.clone())
    }

    pub fn sees_all(&self) -> bool {
        self.scope == Scope::All
    }
}
