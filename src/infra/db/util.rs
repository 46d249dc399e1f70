use std::collections::HashMap;

use uuid::Uuid;

use crate::application::repos::RepoError;

pub fn map_sqlx_error(err: sqlx::Error) -> RepoError {
    match err {
        sqlx::Error::RowNotFound => RepoError::NotFound,
        sqlx::Error::PoolTimedOut => RepoError::Timeout,
        sqlx::Error::Database(db) if db.message().contains("invalid input syntax") => {
            RepoError::InvalidInput {
                message: db.message().to_string(),
            }
        }
        sqlx::Error::Database(db)
            if db
                .message()
                .contains("canceling statement due to user request") =>
        {
            RepoError::Timeout
        }
        other => RepoError::from_persistence(other),
    }
}

pub(super) fn convert_count(value: i64) -> Result<u64, RepoError> {
    value
        .try_into()
        .map_err(|_| RepoError::from_persistence("count exceeds supported range"))
}

/// Build a count map covering every requested id; ids the query did not
/// return get zero.
pub(super) fn fill_counts(
    requested: &[Uuid],
    rows: impl IntoIterator<Item = (Uuid, i64)>,
) -> Result<HashMap<Uuid, u64>, RepoError> {
    let mut counts: HashMap<Uuid, u64> = requested.iter().map(|id| (*id, 0)).collect();
    for (id, count) in rows {
        counts.insert(id, convert_count(count)?);
    }
    Ok(counts)
}
