use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use sqlx::PgPool;

use crate::db::queries::project::{
    create_project, delete_project, get_all_projects, get_project, update_project,
};

/// Defines the project routes to be used in the main router
pub fn project_routes() -> Router<PgPool> {
    Router::new()
        // Create a new project
        .route("/projects", post(create_project))
        // Get all projects
        .route("/projects", get(get_all_projects))
        // Get a single project with its tasks
        .route("/projects/{project_id}", get(get_project))
        // Update a project by ID
        .route("/projects/{project_id}", patch(update_project))
        // Delete a project by ID
        .route("/projects/{project_id}", delete(delete_project))
}
