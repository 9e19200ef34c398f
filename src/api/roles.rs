use crate::api::client::ApiClient;
use crate::api::envelope;
use crate::domain::models::Role;
use crate::error::AppResult;

pub async fn list_roles(api: &ApiClient) -> AppResult<Vec<Role>> {
    let body = api.get("/api/roles/", &[]).await?;
    Ok(envelope::parse_list(body, &["roles"]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::tests::client_for;

    #[tokio::test]
    async fn test_list_roles() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/roles/")
            .with_status(200)
            .with_body(r#"{"roles":[{"_id":1,"name":"Admin","permissions":["*"]},{"id":2,"name":"Sales"}]}"#)
            .create_async()
            .await;

        let client = client_for(&server.url()).await;
        let roles = list_roles(&client).await.unwrap();
        assert_eq!(roles.len(), 2);
        assert!(roles[0].has_permission("leads.assign"));
        assert!(roles[1].permissions.is_empty());
    }
}
