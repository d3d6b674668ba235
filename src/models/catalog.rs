// src/models/catalog.rs
use sqlx::FromRow;

/// Linha genérica (id, nome) das tabelas de referência:
/// estado, carrera, tipo_alarma, tipo_tutoria, clasificacion_tutoria.
#[derive(Debug, Clone, FromRow)]
pub struct CatalogItem {
    pub id: i64,
    pub nombre: String,
}

/// Alarma com o nome do tipo, para os selects do formulário de bitácora.
#[derive(Debug, Clone, FromRow)]
pub struct AlarmOption {
    pub id: i64,
    pub descripcion: Option<String>,
    pub tipo_nombre: String,
}

impl AlarmOption {
    pub fn label(&self) -> String {
        match self.descripcion.as_deref() {
            Some(d) if !d.trim().is_empty() => format!("{} - {}", self.tipo_nombre, d),
            _ => self.tipo_nombre.clone(),
        }
    }
}
