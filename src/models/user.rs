// src/models/user.rs
use serde::Deserialize;
use sqlx::FromRow;

pub const ROLE_TUTOR: &str = "Tutor";
pub const ROLE_COORDINATOR: &str = "Encargado de Carrera";

/// Identidade de login (tabela `cuenta`).
/// Não é o perfil SAT: o perfil é encontrado pelo email.
#[derive(Debug, Clone, FromRow)]
pub struct Account {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub is_superuser: bool,
}

/// Perfil SAT (tabela `usuario`) já com o nome do rol resolvido.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub rut: String,
    pub nombre: String,
    pub apellido: String,
    pub email: String,
    pub rol_id: i64,
    pub rol_nombre: String,
    pub carrera_id: Option<i64>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.nombre, self.apellido)
    }

    pub fn is_tutor(&self) -> bool {
        self.rol_nombre == ROLE_TUTOR
    }
}

/// Dados para criar um perfil.
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub rut: &'a str,
    pub nombre: &'a str,
    pub apellido: &'a str,
    pub email: &'a str,
    pub rol: &'a str,
    pub carrera_id: Option<i64>,
}

// Struct para dados do formulário de login
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}
