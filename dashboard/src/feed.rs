use std::sync::Arc;

use anyhow::Context as _;
use chrono::Utc;
use futures::future::try_join;
use tokio::sync::RwLock;
use tracing::{info, instrument};

use board::types::BoardStats;
use board::{CompletionReceipt, TicketBoard};
use shared::backend::{ApiLocation, ApiUser, BackendClient, CreateTicketRequest};
use shared::{Claimant, Error, Ticket};

use crate::metrics::{ActionKind, Metrics};

/// Shared handles for the feed: the remote API, the in-memory board and
/// the metrics registry.
///
/// Mutations are persisted to the backend first and only then applied to
/// the board, after a read-only precondition check; backend calls are
/// awaited with no lock held. The UI serializes actions per ticket.
#[derive(Clone)]
pub struct Context {
    pub backend: Arc<BackendClient>,
    pub board: Arc<RwLock<TicketBoard>>,
    pub metrics: Arc<Metrics>,
}

impl Context {
    pub fn new(backend: BackendClient, metrics: Arc<Metrics>) -> Self {
        Self {
            backend: Arc::new(backend),
            board: Arc::new(RwLock::new(TicketBoard::new())),
            metrics,
        }
    }

    /// Pulls a fresh ticket/user snapshot and swaps the board. Failure
    /// marks recorded in this process are carried onto the new snapshot;
    /// the backend may not serve the flag yet.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> anyhow::Result<BoardStats> {
        self.metrics.add_backend_request();
        let (tickets, users) = try_join(self.backend.tickets(), self.backend.users()).await?;
        let mut board = TicketBoard::load(tickets, users.into_iter().map(ApiUser::into_user));
        {
            let current = self.board.read().await;
            board.carry_failure_marks(&current);
        }
        let stats = board.stats();
        *self.board.write().await = board;

        self.metrics.set_open_tickets(stats.open as i64);
        info!(
            total = stats.total,
            open = stats.open,
            claimed = stats.claimed,
            completed = stats.completed,
            "refreshed ticket snapshot"
        );
        Ok(stats)
    }

    #[instrument(skip(self, claimant), fields(claimant = claimant.display_name()))]
    pub async fn claim(&self, ticket_id: &str, claimant: Claimant) -> Result<(), Error> {
        self.board.read().await.ensure_claimable(ticket_id)?;
        self.persist_claim_toggle(ticket_id, &claimant).await?;

        let result = {
            let mut board = self.board.write().await;
            board.claim(ticket_id, claimant, Utc::now())
        };
        self.metrics.record(ActionKind::Claim, result.is_ok());
        result
    }

    #[instrument(skip(self, claimant), fields(claimant = claimant.display_name()))]
    pub async fn unclaim(&self, ticket_id: &str, claimant: Claimant) -> Result<(), Error> {
        self.board.read().await.ensure_owned(ticket_id, &claimant)?;
        self.persist_claim_toggle(ticket_id, &claimant).await?;

        let result = {
            let mut board = self.board.write().await;
            board.unclaim(ticket_id, &claimant)
        };
        self.metrics.record(ActionKind::Unclaim, result.is_ok());
        result
    }

    /// Keeps the ticket under the current claim to retry after a failed
    /// completion. Local-only: the backend claim is unchanged.
    #[instrument(skip(self, claimant), fields(claimant = claimant.display_name()))]
    pub async fn reclaim(&self, ticket_id: &str, claimant: Claimant) -> Result<(), Error> {
        let result = {
            let mut board = self.board.write().await;
            board.reclaim(ticket_id, &claimant)
        };
        self.metrics.record(ActionKind::Reclaim, result.is_ok());
        result
    }

    /// Runs the after-photo comparison, persists the outcome (resolution
    /// on success, failed-attempt flag otherwise) and then applies the
    /// completion to the board.
    #[instrument(skip(self, claimant, after_image), fields(claimant = claimant.display_name()))]
    pub async fn complete(
        &self,
        ticket_id: &str,
        claimant: Claimant,
        after_image_url: &str,
        after_image: Vec<u8>,
    ) -> Result<CompletionReceipt, Error> {
        let before_image_url = {
            let board = self.board.read().await;
            board.ensure_owned(ticket_id, &claimant)?;
            board
                .ticket(ticket_id)
                .map(|ticket| ticket.before_image_url.clone())
                .ok_or_else(|| Error::UnknownTicket(ticket_id.to_string()))?
        };

        self.metrics.add_backend_request();
        let comparison = self
            .backend
            .compare_images(&before_image_url, after_image, ticket_id)
            .await
            .map_err(backend_error)?;

        let member = representative(&claimant)?;
        self.metrics.add_backend_request();
        if comparison.is_success() {
            self.backend
                .resolve_ticket(ticket_id, &member)
                .await
                .map_err(backend_error)?;
        } else {
            self.backend
                .flag_failed_attempt(ticket_id, &member)
                .await
                .map_err(backend_error)?;
        }

        let result = {
            let mut board = self.board.write().await;
            board.complete(ticket_id, &claimant, after_image_url, comparison, Utc::now())
        };
        self.metrics
            .record(ActionKind::Complete, matches!(&result, Ok(r) if r.completed));
        result
    }

    /// Classifies the report photo, creates the ticket on the backend and
    /// registers it on the board.
    #[instrument(skip(self, image))]
    pub async fn submit_report(
        &self,
        description: &str,
        lat: f64,
        lng: f64,
        file_name: &str,
        image: Vec<u8>,
    ) -> anyhow::Result<Ticket> {
        self.metrics.add_backend_request();
        let classified = self.backend.classify(file_name, image).await?;
        let severity = classified
            .severity
            .context("classifier returned no severity estimate")?;

        self.metrics.add_backend_request();
        let created = self
            .backend
            .create_ticket(&CreateTicketRequest {
                image_url: None,
                image_base64: classified.image_base64,
                location: ApiLocation { lat, lon: lng },
                severity,
                description: description.to_string(),
            })
            .await?;

        let ticket = Ticket::new(
            created.ticket_id,
            created.description,
            created.severity,
            lat,
            lng,
            created.image_url,
            Utc::now(),
        );
        let result = self.board.write().await.report(ticket.clone());
        self.metrics.record(ActionKind::Report, result.is_ok());
        result?;
        Ok(ticket)
    }

    /// Persists a claim/unclaim toggle, issued once under a representative
    /// member of a squad claim.
    async fn persist_claim_toggle(&self, ticket_id: &str, claimant: &Claimant) -> Result<(), Error> {
        let member = representative(claimant)?;
        self.metrics.add_backend_request();
        self.backend
            .claim_ticket(ticket_id, &member)
            .await
            .map_err(backend_error)
    }
}

fn backend_error(error: anyhow::Error) -> Error {
    Error::Backend(error.to_string())
}

fn representative(claimant: &Claimant) -> Result<shared::UserId, Error> {
    claimant
        .members()
        .into_iter()
        .next()
        .ok_or_else(|| Error::Backend("claim has no members to persist under".to_string()))
}
