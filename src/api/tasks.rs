use crate::api::client::ApiClient;
use crate::api::envelope;
use crate::domain::models::{Task, TaskStatus};
use crate::domain::task::NewTask;
use crate::error::AppResult;
use serde_json::json;

const TASK_KEYS: &[&str] = &["tasks", "task"];

pub async fn list_tasks(api: &ApiClient) -> AppResult<Vec<Task>> {
    let body = api.get("/api/tasks/", &[]).await?;
    Ok(envelope::parse_list(body, TASK_KEYS))
}

pub async fn create_task(api: &ApiClient, task: &NewTask) -> AppResult<Option<Task>> {
    let body = api.post("/api/tasks/", task).await?;
    Ok(envelope::parse_record(body, TASK_KEYS))
}

pub async fn update_status(api: &ApiClient, id: &str, status: TaskStatus) -> AppResult<Option<Task>> {
    let body = api
        .put(&format!("/api/tasks/{}/status", id), &json!({ "status": status }))
        .await?;
    Ok(envelope::parse_record(body, TASK_KEYS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::tests::client_for;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_update_status_payload() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/api/tasks/t9/status")
            .match_body(Matcher::Json(json!({ "status": "in_progress" })))
            .with_status(200)
            .with_body(r#"{"task":{"id":"t9","title":"Demo","status":"in_progress"}}"#)
            .create_async()
            .await;

        let client = client_for(&server.url()).await;
        let task = update_status(&client, "t9", TaskStatus::InProgress).await.unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::InProgress);
        mock.assert_async().await;
    }
}
