// src/test_support.rs
//! Dados de teste partilhados: uma carrera, dois tutores e dois encargados
//! sobre uma base em memória com as migrações reais.
use crate::{
    db::create_test_pool,
    models::{
        access::Access,
        student::NewStudent,
        user::{Account, NewUser, User, ROLE_COORDINATOR, ROLE_TUTOR},
    },
    services::{catalog_service, student_service, user_service},
};
use sqlx::SqlitePool;

pub struct Fixture {
    pub pool: SqlitePool,
    pub carrera_id: i64,
    pub tutor_a: User,
    pub tutor_b: User,
    pub coordinator: User,
    pub coordinator_2: User,
}

impl Fixture {
    pub async fn new() -> Self {
        let pool = create_test_pool().await;
        let carrera_id = catalog_service::create_career(&pool, "Ingeniería Civil Informática", None)
            .await
            .unwrap();

        let tutor_a = profile(&pool, "10-1", "Ana", "Tutora", "ana@ubb.cl", ROLE_TUTOR).await;
        let tutor_b = profile(&pool, "10-2", "Bruno", "Tutor", "bruno@ubb.cl", ROLE_TUTOR).await;
        let coordinator = profile(&pool, "10-3", "Carla", "Encargada", "carla@ubb.cl", ROLE_COORDINATOR).await;
        let coordinator_2 = profile(&pool, "10-4", "Diego", "Encargado", "diego@ubb.cl", ROLE_COORDINATOR).await;

        Fixture {
            pool,
            carrera_id,
            tutor_a,
            tutor_b,
            coordinator,
            coordinator_2,
        }
    }

    pub async fn status_id(&self, nombre: &str) -> i64 {
        catalog_service::find_status_id(&self.pool, nombre)
            .await
            .unwrap()
            .unwrap_or_else(|| panic!("estado '{}' não semeado", nombre))
    }

    /// Cria um estudiante; o email deriva do rut.
    pub async fn student(&self, rut: &str, apellido: &str, tutor_id: Option<i64>, estado: &str) -> i64 {
        self.student_in_year(rut, apellido, tutor_id, estado, 2023).await
    }

    pub async fn student_in_year(
        &self,
        rut: &str,
        apellido: &str,
        tutor_id: Option<i64>,
        estado: &str,
        anio_ingreso: i64,
    ) -> i64 {
        let estado_id = self.status_id(estado).await;
        student_service::create_student(
            &self.pool,
            &NewStudent {
                rut: rut.to_string(),
                nombre: "Estudiante".to_string(),
                apellido: apellido.to_string(),
                email: format!("{}@alumnos.ubb.cl", rut.replace(&['.', '-'][..], "")),
                anio_ingreso,
                lugar_procedencia: Some("Chillán".to_string()),
                carrera_id: self.carrera_id,
                tutor_id,
                estado_id,
                ..Default::default()
            },
        )
        .await
        .unwrap()
    }

    pub fn access_for(&self, user: &User) -> Access {
        Access::resolve(&account(&user.email, false), Some(user.clone()))
    }

    pub fn superuser_access(&self) -> Access {
        Access::resolve(&account("root@ubb.cl", true), None)
    }

    pub fn anonymous_access(&self) -> Access {
        Access::resolve(&account("sinperfil@ubb.cl", false), None)
    }
}

fn account(email: &str, is_superuser: bool) -> Account {
    Account {
        id: 0,
        email: email.to_string(),
        password_hash: String::new(),
        is_superuser,
    }
}

async fn profile(
    pool: &SqlitePool,
    rut: &str,
    nombre: &str,
    apellido: &str,
    email: &str,
    rol: &str,
) -> User {
    let id = user_service::create_user(
        pool,
        &NewUser {
            rut,
            nombre,
            apellido,
            email,
            rol,
            carrera_id: None,
        },
    )
    .await
    .unwrap();
    user_service::find_user_by_id(pool, id).await.unwrap().unwrap()
}
