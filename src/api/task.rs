use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use sqlx::PgPool;

use crate::db::queries::task::{
    add_activity, create_tasks, delete_activity, delete_task, get_project_tasks, get_task,
    update_task,
};

/// Defines the task and activity routes to be used in the main router
pub fn task_routes() -> Router<PgPool> {
    Router::new()
        // Create a validated batch of tasks under a project
        .route("/projects/{project_id}/tasks", post(create_tasks))
        // Get a project's tasks with their activities
        .route("/projects/{project_id}/tasks", get(get_project_tasks))
        // Get a single task with its activities
        .route("/tasks/{task_id}", get(get_task))
        // Update a task by ID
        .route("/tasks/{task_id}", patch(update_task))
        // Delete a task by ID
        .route("/tasks/{task_id}", delete(delete_task))
        // Add an activity to a task
        .route("/tasks/{task_id}/activities", post(add_activity))
        // Remove an activity from a task
        .route("/tasks/{task_id}/activities/{activity_id}", delete(delete_activity))
}
