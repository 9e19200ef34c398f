use crate::api::client::ApiClient;
use crate::api::envelope;
use crate::domain::lead::Lead;
use crate::domain::models::{Assignment, AssignmentRequest, LeadSource, SalesUser};
use crate::error::AppResult;
use chrono::Utc;

pub async fn fetch_leads(api: &ApiClient, limit: usize) -> AppResult<Vec<Lead>> {
    let body = api.get("/api/lead/leads", &[("limit", limit.to_string())]).await?;
    let mut leads = Lead::from_values(envelope::records(body, &["leads"]));
    leads.truncate(limit);
    Ok(leads)
}

/// Leads assigned to the authenticated user.
pub async fn fetch_assigned_leads(api: &ApiClient) -> AppResult<Vec<Lead>> {
    let body = api.get("/api/assigned-leads/", &[]).await?;
    Ok(Lead::from_values(envelope::records(body, &["leads", "assigned_leads"])))
}

pub async fn fetch_assignments(api: &ApiClient) -> AppResult<Vec<Assignment>> {
    let body = api.get("/api/lead/assignments", &[]).await?;
    Ok(envelope::parse_list(body, &["assignments"]))
}

/// Creates or replaces the assignment for `request.lead_id`. A success
/// response without a readable record still counts as accepted.
pub async fn create_assignment(api: &ApiClient, request: &AssignmentRequest) -> AppResult<Assignment> {
    let body = api.post("/api/lead/assignments", request).await?;
    let assignment = envelope::parse_record::<Assignment>(body, &["assignment"])
        .filter(|a| a.lead_id == request.lead_id)
        .unwrap_or_else(|| request.to_assignment(Utc::now()));
    Ok(assignment)
}

pub async fn fetch_sales_users(api: &ApiClient) -> AppResult<Vec<SalesUser>> {
    let body = api.get("/api/employees/sales-users", &[]).await?;
    Ok(envelope::parse_list(body, &["users", "employees"]))
}

pub async fn fetch_sources(api: &ApiClient) -> AppResult<Vec<LeadSource>> {
    let body = api.get("/api/lead/sources", &[]).await?;
    Ok(envelope::parse_list(body, &["sources", "integrations"]))
}

pub async fn fetch_integrations(api: &ApiClient) -> AppResult<Vec<LeadSource>> {
    let body = api.get("/api/lead/integrations", &[]).await?;
    Ok(envelope::parse_list(body, &["integrations", "sources"]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::tests::client_for;
    use crate::domain::models::SalesRole;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_fetch_leads_passes_limit() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/lead/leads")
            .match_query(Matcher::UrlEncoded("limit".into(), "2".into()))
            .with_status(200)
            .with_body(r#"{"success":true,"data":{"leads":[{"_id":"a","name":"A"},{"id":2},{"id":3}]}}"#)
            .create_async()
            .await;

        let client = client_for(&server.url()).await;
        let leads = fetch_leads(&client, 2).await.unwrap();
        assert_eq!(leads.iter().map(|l| l.id.as_str()).collect::<Vec<_>>(), vec!["a", "2"]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_assignment_falls_back_to_request() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/lead/assignments")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "lead_id": "1",
                "assigned_to": "3",
                "assigned_role": "sales_manager"
            })))
            .with_status(201)
            .with_body(r#"{"message":"assigned"}"#)
            .create_async()
            .await;

        let client = client_for(&server.url()).await;
        let request = AssignmentRequest {
            lead_id: "1".into(),
            assigned_to: "3".into(),
            assigned_role: SalesRole::SalesManager,
            assigned_to_name: None,
            notes: None,
        };
        let assignment = create_assignment(&client, &request).await.unwrap();
        assert_eq!(assignment.lead_id, "1");
        assert_eq!(assignment.assigned_to, "3");
        assert_eq!(assignment.assigned_role, "sales_manager");
    }

    #[tokio::test]
    async fn test_fetch_assignments_and_users() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/lead/assignments")
            .with_status(200)
            .with_body(r#"{"assignments":[{"lead_id":1,"assigned_to":"3","assigned_role":"sales_manager"},{"broken":true}]}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/api/employees/sales-users")
            .with_status(200)
            .with_body(r#"[{"id":3,"name":"Priya","email":"p@x.in","role":"sales_manager"},{"id":4,"name":"HR","role":"hr"}]"#)
            .create_async()
            .await;

        let client = client_for(&server.url()).await;
        let assignments = fetch_assignments(&client).await.unwrap();
        assert_eq!(assignments.len(), 1);
        assert_eq!(assignments[0].lead_id, "1");

        let users = fetch_sales_users(&client).await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].role, SalesRole::SalesManager);
    }
}
