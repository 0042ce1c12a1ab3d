//! crates/reviewiz_core/src/employees.rs

use tracing::{error, info};
use uuid::Uuid;

use crate::domain::UserId;
use crate::ports::{PortResult, TeamStore};

/// Deletes an employee, then its notes, then its generated artifacts.
///
/// The steps are separate writes. If a child deletion fails the employee is
/// already gone and the leftover children are unreachable through the API.
pub async fn delete_employee_cascade<S>(
    store: &S,
    user_id: &UserId,
    employee_id: Uuid,
) -> PortResult<()>
where
    S: TeamStore + ?Sized,
{
    store.delete_employee(user_id, employee_id).await?;

    if let Err(e) = store.delete_notes_for_employee(user_id, employee_id).await {
        error!("Employee {} deleted but its notes were not: {:?}", employee_id, e);
        return Err(e);
    }
    if let Err(e) = store.delete_artifacts_for_employee(user_id, employee_id).await {
        error!("Employee {} deleted but its artifacts were not: {:?}", employee_id, e);
        return Err(e);
    }

    info!("Deleted employee {} with its notes and artifacts", employee_id);
    Ok(())
}
