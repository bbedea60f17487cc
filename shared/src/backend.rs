use anyhow::bail;
use chrono::{DateTime, Utc};
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use tracing::instrument;

use crate::*;

/// HTTP client for the remote StreetSweep API. The API is the system of
/// record; this client only moves snapshots and mutations over the wire.
#[derive(Clone, Debug)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ApiLocation {
    pub lat: f64,
    pub lon: f64,
}

/// Ticket as the backend serves it. `claimed`/`resolved` booleans instead
/// of a state enum; [`ApiTicket::into_ticket`] derives the rest.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ApiTicket {
    #[serde(rename = "_id")]
    pub id: String,
    pub image_url: String,
    pub location: ApiLocation,
    pub severity: f64,
    pub description: String,
    pub claimed: bool,
    pub resolved: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub resolved_by: Option<String>,
    #[serde(default)]
    pub claimed_by: Option<String>,
    #[serde(default)]
    pub claimed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub had_failed_attempt: bool,
}

impl ApiTicket {
    pub fn into_ticket(self) -> Ticket {
        let state = if self.resolved {
            TicketState::Completed
        } else if self.claimed {
            TicketState::Claimed
        } else {
            TicketState::Open
        };
        let claimed_by = self.claimed_by.map(Claimant::Individual);
        // A claim without a timestamp still counts; backfill with the
        // report time to keep the both-or-neither invariant.
        let created_at = self.created_at.unwrap_or_else(Utc::now);
        let claimed_at = match &claimed_by {
            Some(_) => Some(self.claimed_at.unwrap_or(created_at)),
            None => None,
        };

        Ticket {
            title: title_from_description(&self.description),
            priority: TicketPriority::from_severity(self.severity),
            camera_id: "user-report".to_string(),
            camera_name: format!("{:.4}, {:.4}", self.location.lat, self.location.lon),
            num_detections: (self.severity * 3.0).floor() as u32,
            after_image_url: self.resolved.then(|| self.image_url.clone()),
            completed_at: if self.resolved { self.resolved_at } else { None },
            id: self.id,
            description: self.description,
            lat: self.location.lat,
            lng: self.location.lon,
            created_at,
            state,
            severity: self.severity,
            before_image_url: self.image_url,
            claimed_by,
            claimed_at,
            had_failed_attempt: self.had_failed_attempt,
        }
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ApiUser {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub points: Option<u32>,
}

impl ApiUser {
    pub fn into_user(self) -> User {
        User {
            id: self.id,
            name: self.name,
            email: self.email,
            points: self.points.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct CreateTicketRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_base64: Option<String>,
    pub location: ApiLocation,
    pub severity: f64,
    pub description: String,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct CreateTicketResponse {
    pub ticket_id: String,
    pub image_url: String,
    pub severity: f64,
    pub description: String,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct ClassifyResponse {
    pub severity: Option<f64>,
    #[serde(default)]
    pub image_base64: Option<String>,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> anyhow::Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            base_url,
            token,
        })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut request = self.http.request(method, format!("{}{path}", self.base_url));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        request
    }

    // The backend reports failures as an `error` or `detail` field in an
    // otherwise 2xx body as often as through the status code.
    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> anyhow::Result<T> {
        let status = response.status();
        let body: serde_json::Value = response.json().await?;
        if let Some(error) = body.get("error").and_then(|e| e.as_str()) {
            bail!("backend error: {error}");
        }
        if let Some(detail) = body.get("detail").and_then(|d| d.as_str()) {
            bail!("backend error: {detail}");
        }
        if !status.is_success() {
            bail!("backend returned {status}");
        }
        Ok(serde_json::from_value(body)?)
    }

    #[instrument(skip(self))]
    pub async fn health(&self) -> bool {
        let Ok(response) = self.request(reqwest::Method::GET, "/health").send().await else {
            return false;
        };
        let Ok(body) = response.json::<serde_json::Value>().await else {
            return false;
        };
        body.get("status").and_then(|s| s.as_str()) == Some("ok")
    }

    #[instrument(skip(self))]
    pub async fn tickets(&self) -> anyhow::Result<Vec<Ticket>> {
        #[derive(serde::Deserialize)]
        struct TicketsResponse {
            #[serde(default)]
            tickets: Vec<ApiTicket>,
        }

        let response = self.request(reqwest::Method::GET, "/tickets").send().await?;
        let body: TicketsResponse = Self::parse(response).await?;
        Ok(body.tickets.into_iter().map(ApiTicket::into_ticket).collect())
    }

    #[instrument(skip(self))]
    pub async fn ticket(&self, ticket_id: &str) -> anyhow::Result<Ticket> {
        let response = self
            .request(reqwest::Method::GET, &format!("/tickets/{ticket_id}"))
            .send()
            .await?;
        let ticket: ApiTicket = Self::parse(response).await?;
        Ok(ticket.into_ticket())
    }

    #[instrument(skip(self, request))]
    pub async fn create_ticket(
        &self,
        request: &CreateTicketRequest,
    ) -> anyhow::Result<CreateTicketResponse> {
        let response = self
            .request(reqwest::Method::POST, "/create-ticket")
            .json(request)
            .send()
            .await?;
        Self::parse(response).await
    }

    /// Persists a claim/unclaim toggle for the ticket.
    #[instrument(skip(self))]
    pub async fn claim_ticket(&self, ticket_id: &str, user_id: &str) -> anyhow::Result<()> {
        let response = self
            .request(reqwest::Method::POST, "/claim-ticket")
            .json(&serde_json::json!({
                "ticket_id": ticket_id,
                "user_id": user_id,
            }))
            .send()
            .await?;
        let _: serde_json::Value = Self::parse(response).await?;
        Ok(())
    }

    /// Records a failed completion attempt on the ticket, so the
    /// half-points cap holds across restarts and other clients' snapshots.
    #[instrument(skip(self))]
    pub async fn flag_failed_attempt(&self, ticket_id: &str, user_id: &str) -> anyhow::Result<()> {
        let response = self
            .request(reqwest::Method::POST, "/flag-attempt")
            .json(&serde_json::json!({
                "ticket_id": ticket_id,
                "user_id": user_id,
            }))
            .send()
            .await?;
        let _: serde_json::Value = Self::parse(response).await?;
        Ok(())
    }

    /// Persists a completion.
    #[instrument(skip(self))]
    pub async fn resolve_ticket(&self, ticket_id: &str, user_id: &str) -> anyhow::Result<()> {
        let response = self
            .request(reqwest::Method::POST, "/resolve-ticket")
            .json(&serde_json::json!({
                "ticket_id": ticket_id,
                "user_id": user_id,
            }))
            .send()
            .await?;
        let _: serde_json::Value = Self::parse(response).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn users(&self) -> anyhow::Result<Vec<ApiUser>> {
        #[derive(serde::Deserialize)]
        struct UsersResponse {
            #[serde(default)]
            users: Vec<ApiUser>,
        }

        let response = self.request(reqwest::Method::GET, "/users").send().await?;
        let body: UsersResponse = Self::parse(response).await?;
        Ok(body.users)
    }

    /// Ranked users, assembled client side: sort by points descending,
    /// attach 1-based ranks, paginate. Pages are 1-based.
    #[instrument(skip(self))]
    pub async fn leaderboard(
        &self,
        page: u64,
        page_size: u64,
    ) -> anyhow::Result<(Vec<LeaderboardEntry>, u64)> {
        let users: Vec<User> = self
            .users()
            .await?
            .into_iter()
            .map(ApiUser::into_user)
            .collect();
        let total = users.len() as u64;
        let ranked = rank_users(users.iter());
        let start = (page.saturating_sub(1) * page_size) as usize;
        let entries = ranked
            .into_iter()
            .skip(start)
            .take(page_size as usize)
            .collect();
        Ok((entries, total))
    }

    /// Black-box severity estimation for a new report photo.
    #[instrument(skip(self, image))]
    pub async fn classify(
        &self,
        file_name: &str,
        image: Vec<u8>,
    ) -> anyhow::Result<ClassifyResponse> {
        let form = Form::new().part("file", Part::bytes(image).file_name(file_name.to_string()));
        let response = self
            .request(reqwest::Method::POST, "/classify")
            .multipart(form)
            .send()
            .await?;
        Self::parse(response).await
    }

    /// Black-box judgment of whether the after-photo shows the same
    /// location and a successful cleanup.
    #[instrument(skip(self, after_image))]
    pub async fn compare_images(
        &self,
        before_image_url: &str,
        after_image: Vec<u8>,
        ticket_id: &str,
    ) -> anyhow::Result<ComparisonResult> {
        let form = Form::new()
            .text("before_image_url", before_image_url.to_string())
            .text("ticket_id", ticket_id.to_string())
            .part("file", Part::bytes(after_image).file_name("after.jpg"));
        let response = self
            .request(reqwest::Method::POST, "/compare")
            .multipart(form)
            .send()
            .await?;
        let body: serde_json::Value = Self::parse(response).await?;
        // Either a bare boolean or the structured judgment.
        if let Some(ok) = body.as_bool() {
            return Ok(ComparisonResult::from(ok));
        }
        Ok(serde_json::from_value(body)?)
    }
}
