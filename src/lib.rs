pub mod branches;
pub mod companies;
pub mod config;
pub mod constants;
pub mod error;
pub mod extract;
pub mod groups;
pub mod joins;
pub mod membership;
pub mod models;
pub mod payments;
pub mod repository;
pub mod store;
pub mod students;
pub mod tasks;
pub mod teachers;
pub mod utils;

use axum::{
    Json, Router,
    http::StatusCode,
    routing::{get, put},
};
use serde_json::{Value, json};

// Re-export types at crate root for convenient importing
pub use crate::error::{ApiError, StoreError};
pub use crate::repository::{Entity, Repository};
pub use crate::store::DocumentStore;

use crate::constants::{ERR_ENDPOINT_HINT, ERR_ENDPOINT_NOT_FOUND};
use crate::models::{Branch, Company, Group, Student, Task, Teacher};

/// Application state shared across all request handlers
#[derive(Clone)]
pub struct AppState {
    pub store: DocumentStore,
}

impl AppState {
    pub fn new(store: DocumentStore) -> Self {
        Self { store }
    }

    pub fn teachers(&self) -> Repository<Teacher> {
        Repository::new(self.store.clone())
    }

    pub fn students(&self) -> Repository<Student> {
        Repository::new(self.store.clone())
    }

    pub fn groups(&self) -> Repository<Group> {
        Repository::new(self.store.clone())
    }

    pub fn tasks(&self) -> Repository<Task> {
        Repository::new(self.store.clone())
    }

    pub fn companies(&self) -> Repository<Company> {
        Repository::new(self.store.clone())
    }

    pub fn branches(&self) -> Repository<Branch> {
        Repository::new(self.store.clone())
    }
}

/// The full route table; middleware layers are added by the caller.
pub fn app_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route(
            "/teachers",
            get(teachers::get_teachers).post(teachers::create_teacher),
        )
        .route(
            "/teachers/{id}",
            put(teachers::update_teacher).delete(teachers::delete_teacher),
        )
        .route(
            "/students",
            get(students::get_students).post(students::create_student),
        )
        .route(
            "/students/{id}",
            put(students::update_student).delete(students::delete_student),
        )
        .route("/students/{id}/group", put(students::update_student_group))
        .route("/groups", get(groups::get_groups).post(groups::create_group))
        .route(
            "/groups/{id}",
            get(groups::get_group)
                .put(groups::update_group)
                .delete(groups::delete_group),
        )
        .route("/groups/{id}/add-student", put(groups::add_student))
        .route("/groups/{id}/remove-student", put(groups::remove_student))
        .route(
            "/payments",
            get(payments::get_payments).post(payments::create_payment),
        )
        .route("/tasks", get(tasks::get_tasks).post(tasks::create_task))
        .route("/tasks/group/{group_id}", get(tasks::get_tasks_by_group))
        .route(
            "/tasks/{id}",
            put(tasks::update_task).delete(tasks::delete_task),
        )
        .route(
            "/companies",
            get(companies::get_companies).post(companies::create_company),
        )
        .route(
            "/companies/{id}",
            put(companies::update_company).delete(companies::delete_company),
        )
        .route(
            "/branches",
            get(branches::get_branches).post(branches::create_branch),
        )
        .route(
            "/branches/{id}",
            put(branches::update_branch).delete(branches::delete_branch),
        )
        .fallback(not_found)
        .with_state(app_state)
}

async fn root() -> Json<Value> {
    Json(json!({
        "message": "Learning center server is running",
        "endpoints": {
            "teachers": "/teachers",
            "students": "/students",
            "groups": "/groups",
            "payments": "/payments",
            "tasks": "/tasks",
            "companies": "/companies",
            "branches": "/branches"
        }
    }))
}

async fn not_found() -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": ERR_ENDPOINT_NOT_FOUND,
            "message": ERR_ENDPOINT_HINT
        })),
    )
}
