//! Ownership filter for update/delete on models with an owner column.
//!
//! The check reads the live row and the mutation follows in a separate statement; a concurrent
//! owner change between the two is not guarded against.

use crate::access::{Actor, Decision};
use crate::error::AppError;
use crate::schema::ResolvedTable;
use crate::service::SqlExecutor;
use crate::sql::select_owner;
use serde_json::Value;

pub async fn check_ownership(
    executor: &dyn SqlExecutor,
    table: &ResolvedTable,
    decision: &Decision,
    record_id: i64,
    actor: &Actor,
) -> Result<(), AppError> {
    if !decision.requires_ownership_check || actor.role.is_admin() {
        return Ok(());
    }
    let Some(owner_column) = table.owner_column.as_deref() else {
        return Ok(());
    };
    let mut q = select_owner(table, owner_column);
    q.params.push(Value::from(record_id));
    let row = executor
        .fetch_optional(&q)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("record {} in {}", record_id, table.model_name)))?;
    let owner = row.get(owner_column).and_then(Value::as_i64);
    if owner != Some(actor.id) {
        tracing::warn!(
            model = %table.model_name,
            record_id,
            actor = actor.id,
            "ownership check denied"
        );
        return Err(AppError::Forbidden("you can only modify your own records".into()));
    }
    Ok(())
}
