use crate::db::operations::sessions as session_ops;
use crate::db::Database;
use crate::models::{Session, SessionStatus};
use crate::services::{ServiceError, ServiceResult};

pub async fn create_session(db: &Database, topic: Option<&str>) -> ServiceResult<Session> {
    let session = Session::new(topic);
    session_ops::insert_session(db.pool(), &session).await?;
    tracing::info!(session_id = %session.id, topic = session.display_topic(), "session created");

    get_session(db, &session.id).await
}

pub async fn get_session(db: &Database, id: &str) -> ServiceResult<Session> {
    session_ops::fetch_session(db.pool(), id)
        .await?
        .ok_or_else(|| ServiceError::session_not_found(id))
}

pub async fn list_sessions(db: &Database) -> ServiceResult<Vec<Session>> {
    Ok(session_ops::fetch_sessions(db.pool()).await?)
}

/// User-requested status change. Only LEARNING can be requested; DONE is set by
/// grading in [`crate::services::evaluation::submit_learning`].
pub async fn update_status(
    db: &Database,
    id: &str,
    target: SessionStatus,
) -> ServiceResult<Session> {
    let mut tx = db.pool().begin().await?;

    let current = session_ops::fetch_session_status(&mut *tx, id)
        .await?
        .ok_or_else(|| ServiceError::session_not_found(id))?;
    let next = current.transition(target)?;
    session_ops::update_session_status(&mut *tx, id, next).await?;

    tx.commit().await?;
    tracing::info!(
        session_id = %id,
        from = current.as_str(),
        to = next.as_str(),
        "session status updated"
    );

    get_session(db, id).await
}

/// Replaces the topic verbatim; an empty string is a valid topic.
pub async fn update_topic(db: &Database, id: &str, topic: &str) -> ServiceResult<Session> {
    if !session_ops::update_session_topic(db.pool(), id, topic).await? {
        return Err(ServiceError::session_not_found(id));
    }
    get_session(db, id).await
}

/// Removes the session; its words go with it through the cascading foreign key.
pub async fn delete_session(db: &Database, id: &str) -> ServiceResult<()> {
    if !session_ops::delete_session(db.pool(), id).await? {
        return Err(ServiceError::session_not_found(id));
    }
    tracing::info!(session_id = %id, "session deleted");
    Ok(())
}
