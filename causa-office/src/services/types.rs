use std::collections::HashMap;

use serde_json::Value;
use tokio::sync::RwLock;

pub type OfficeParams = causa_axum::RestParams;

/// Records keyed by partition, then by id.
pub type Partitioned = RwLock<HashMap<String, HashMap<String, Value>>>;

/// In-memory office data. Everything except notifications is partitioned
/// by owner; notifications belong to the recipient user.
#[derive(Default)]
pub struct OfficeState {
    pub clients_by_owner: Partitioned,
    pub cases_by_owner: Partitioned,
    pub progress_by_owner: Partitioned,
    pub appointments_by_owner: Partitioned,
    pub reschedules_by_owner: Partitioned,
    pub fees_by_owner: Partitioned,
    pub notifications_by_user: Partitioned,
}
