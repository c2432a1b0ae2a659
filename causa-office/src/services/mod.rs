use std::sync::Arc;

use causa_auth::{MemoryIdentityStore, PermissionGate};
use causa_core::{CausaApp, CausaService};
use serde_json::Value;

pub mod adapters;
pub mod cascade;
pub mod references;
pub mod types;
pub use types::{OfficeParams, OfficeState};

pub mod appointments;
pub mod capabilities;
pub mod case_progress;
pub mod cases;
pub mod clients;
pub mod delegates;
pub mod fees;
pub mod notifications;
pub mod reschedules;

type Svc = Arc<dyn CausaService<Value, OfficeParams>>;

/// REST paths of every office service, in mount order. The service name is
/// the path without its leading slash.
pub const PATHS: [&str; 9] = [
    "/clients",
    "/cases",
    "/case-progress",
    "/appointments",
    "/reschedules",
    "/fees",
    "/delegates",
    "/capabilities",
    "/notifications",
];

/// Register every office service on `app` and attach its permission hooks.
///
/// Services go in first: hooks look their service up by name, and
/// reference checks call sibling services at request time.
pub fn configure(
    app: &CausaApp<Value, OfficeParams>,
    state: Arc<OfficeState>,
    store: Arc<MemoryIdentityStore>,
    gate: &PermissionGate,
) -> anyhow::Result<()> {
    let services: [(&str, Svc); 9] = [
        ("clients", Arc::new(clients::ClientsService::new(Arc::clone(&state)))),
        ("cases", Arc::new(cases::CasesService::new(Arc::clone(&state)))),
        ("case-progress", Arc::new(case_progress::CaseProgressService::new(Arc::clone(&state)))),
        ("appointments", Arc::new(appointments::AppointmentsService::new(Arc::clone(&state)))),
        ("reschedules", Arc::new(reschedules::ReschedulesService::new(Arc::clone(&state)))),
        ("fees", Arc::new(fees::FeesService::new(Arc::clone(&state)))),
        ("delegates", Arc::new(delegates::DelegatesService::new(Arc::clone(&store)))),
        ("capabilities", Arc::new(capabilities::CapabilitiesService::new(store))),
        ("notifications", Arc::new(notifications::NotificationsService::new(state))),
    ];
    for (name, service) in services {
        app.register_service(name, service);
    }

    clients::clients_shared::register_hooks(app, gate)?;
    cases::cases_shared::register_hooks(app, gate)?;
    case_progress::case_progress_shared::register_hooks(app, gate)?;
    appointments::appointments_shared::register_hooks(app, gate)?;
    reschedules::reschedules_shared::register_hooks(app, gate)?;
    fees::fees_shared::register_hooks(app, gate)?;
    delegates::delegates_shared::register_hooks(app, gate)?;
    capabilities::capabilities_shared::register_hooks(app, gate)?;
    notifications::notifications_shared::register_hooks(app, gate)?;
    Ok(())
}
