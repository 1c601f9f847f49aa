use bloxmesh_database::Database;
use bloxmesh_models::{
    automation::{AutomationCommand, AutomationDocument, AUTOMATION_COLLECTION},
    roblox::id::GroupId,
};

use crate::error::CoreError;

/// Reads a group's automation document. A group that never wrote one gets the
/// empty default.
///
/// # Errors
///
/// See [`CoreError`] for details.
pub async fn load(database: &Database, group_id: GroupId) -> Result<AutomationDocument, CoreError> {
    let document = database
        .get::<AutomationDocument>(AUTOMATION_COLLECTION, &group_id.to_string())
        .await?;
    Ok(document.unwrap_or_default())
}

/// Runs a read-modify-write cycle on a group's document while holding the
/// group's lock. The document is only written back when `f` changed it.
///
/// # Errors
///
/// Returns the error of `f` (nothing is written then) or a database error.
pub async fn update<T, F>(
    database: &Database,
    group_id: GroupId,
    f: F,
) -> Result<(AutomationDocument, T), CoreError>
where
    F: FnOnce(&mut AutomationDocument) -> Result<T, CoreError>,
{
    let id = group_id.to_string();
    let _guard = database.lock(AUTOMATION_COLLECTION, &id).await;

    let original = database
        .get::<AutomationDocument>(AUTOMATION_COLLECTION, &id)
        .await?
        .unwrap_or_default();
    let mut document = original.clone();
    let res = f(&mut document)?;

    if document != original {
        database.set(AUTOMATION_COLLECTION, &id, &document).await?;
    }
    Ok((document, res))
}

/// Applies a single command. Returns whether it changed the document.
///
/// # Errors
///
/// See [`CoreError`] for details.
pub async fn apply(
    database: &Database,
    group_id: GroupId,
    command: AutomationCommand,
) -> Result<(AutomationDocument, bool), CoreError> {
    update(database, group_id, |document| Ok(document.apply(command)?)).await
}
