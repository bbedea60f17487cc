use prometheus_client::encoding::text::encode;
use prometheus_client::encoding::{EncodeLabelSet, EncodeLabelValue};
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::Registry;

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, EncodeLabelValue)]
pub enum ActionKind {
    Refresh,
    Report,
    Claim,
    Unclaim,
    Reclaim,
    Complete,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct ActionRecord {
    pub action: ActionKind,
    pub success: u32,
}

pub struct Metrics {
    registry: Registry,
    actions: Family<ActionRecord, Counter>,
    backend_requests: Counter,
    open_tickets: Gauge,
}

impl Default for Metrics {
    fn default() -> Self {
        let mut registry = Registry::default();
        let actions = Family::default();
        let backend_requests = Counter::default();
        let open_tickets = Gauge::default();

        registry.register(
            "dashboard_action",
            "Lifecycle action executed against the board",
            actions.clone(),
        );
        registry.register(
            "backend_requests",
            "Requests issued to the StreetSweep backend",
            backend_requests.clone(),
        );
        registry.register(
            "open_tickets",
            "Open tickets in the latest snapshot",
            open_tickets.clone(),
        );

        Self {
            registry,
            actions,
            backend_requests,
            open_tickets,
        }
    }
}

impl Metrics {
    pub fn record(&self, action: ActionKind, success: bool) {
        self.actions
            .get_or_create(&ActionRecord {
                action,
                success: success as u32,
            })
            .inc();
    }

    pub fn add_backend_request(&self) {
        self.backend_requests.inc();
    }

    pub fn set_open_tickets(&self, value: i64) {
        self.open_tickets.set(value);
    }

    pub fn encode(&self) -> anyhow::Result<String> {
        let mut body = String::new();
        encode(&mut body, &self.registry)?;
        Ok(body)
    }
}
