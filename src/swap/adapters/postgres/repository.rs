//! `PostgreSQL` repository implementation for swap negotiations.

use super::{
    models::{NegotiationRow, NewNegotiationRow},
    schema::swap_negotiations,
};
use crate::slot::{
    adapters::postgres::apply_pair_update,
    domain::{SlotId, UserId},
    ports::SlotPairUpdate,
};
use crate::swap::{
    domain::{NegotiationId, PersistedNegotiationData, SwapNegotiation, SwapOutcome},
    ports::{NegotiationRepository, NegotiationRepositoryError, NegotiationRepositoryResult},
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type used by negotiation adapters.
pub type NegotiationPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed negotiation repository.
///
/// Resolutions update the `slots` table in the same transaction as the
/// outcome, so the pool must point at the database holding the slots.
#[derive(Debug, Clone)]
pub struct PostgresNegotiationRepository {
    pool: NegotiationPgPool,
}

impl PostgresNegotiationRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: NegotiationPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> NegotiationRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> NegotiationRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(NegotiationRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(NegotiationRepositoryError::persistence)?
    }
}

impl From<DieselError> for NegotiationRepositoryError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

#[async_trait]
impl NegotiationRepository for PostgresNegotiationRepository {
    async fn store(&self, negotiation: &SwapNegotiation) -> NegotiationRepositoryResult<()> {
        let negotiation_id = negotiation.id();
        let new_row = to_new_row(negotiation);

        self.run_blocking(move |connection| {
            diesel::insert_into(swap_negotiations::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        NegotiationRepositoryError::DuplicateNegotiation(negotiation_id)
                    }
                    _ => NegotiationRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn find_by_id(
        &self,
        id: NegotiationId,
    ) -> NegotiationRepositoryResult<Option<SwapNegotiation>> {
        self.run_blocking(move |connection| {
            let row = swap_negotiations::table
                .filter(swap_negotiations::id.eq(id.into_inner()))
                .select(NegotiationRow::as_select())
                .first::<NegotiationRow>(connection)
                .optional()
                .map_err(NegotiationRepositoryError::persistence)?;
            row.map(row_to_negotiation).transpose()
        })
        .await
    }

    async fn record_resolution(
        &self,
        negotiation: &SwapNegotiation,
        slots: &SlotPairUpdate,
    ) -> NegotiationRepositoryResult<()> {
        let id = negotiation.id();
        let outcome = negotiation.outcome().as_str().to_owned();
        let resolved_at = negotiation.resolved_at();
        let update = slots.clone();

        self.run_blocking(move |connection| {
            connection.transaction::<_, NegotiationRepositoryError, _>(|tx_conn| {
                apply_pair_update(tx_conn, &update)?;

                let updated = diesel::update(
                    swap_negotiations::table
                        .filter(swap_negotiations::id.eq(id.into_inner()))
                        .filter(swap_negotiations::outcome.eq(SwapOutcome::Pending.as_str())),
                )
                .set((
                    swap_negotiations::outcome.eq(outcome),
                    swap_negotiations::resolved_at.eq(resolved_at),
                ))
                .execute(tx_conn)
                .map_err(NegotiationRepositoryError::persistence)?;

                if updated > 0 {
                    return Ok(());
                }
                Err(explain_missed_outcome(tx_conn, id)?)
            })
        })
        .await
    }

    async fn list_by_proposer(
        &self,
        proposer_id: UserId,
    ) -> NegotiationRepositoryResult<Vec<SwapNegotiation>> {
        self.run_blocking(move |connection| {
            let rows = swap_negotiations::table
                .filter(swap_negotiations::proposer_id.eq(proposer_id.into_inner()))
                .order((
                    swap_negotiations::created_at.desc(),
                    swap_negotiations::id.asc(),
                ))
                .select(NegotiationRow::as_select())
                .load::<NegotiationRow>(connection)
                .map_err(NegotiationRepositoryError::persistence)?;
            rows.into_iter().map(row_to_negotiation).collect()
        })
        .await
    }

    async fn list_pending_for_requested_slots(
        &self,
        slot_ids: &[SlotId],
    ) -> NegotiationRepositoryResult<Vec<SwapNegotiation>> {
        if slot_ids.is_empty() {
            return Ok(Vec::new());
        }
        let requested: Vec<uuid::Uuid> = slot_ids.iter().map(|id| id.into_inner()).collect();

        self.run_blocking(move |connection| {
            let rows = swap_negotiations::table
                .filter(swap_negotiations::requested_slot_id.eq_any(requested))
                .filter(swap_negotiations::outcome.eq(SwapOutcome::Pending.as_str()))
                .order((
                    swap_negotiations::created_at.desc(),
                    swap_negotiations::id.asc(),
                ))
                .select(NegotiationRow::as_select())
                .load::<NegotiationRow>(connection)
                .map_err(NegotiationRepositoryError::persistence)?;
            rows.into_iter().map(row_to_negotiation).collect()
        })
        .await
    }
}


/// Distinguishes a missing negotiation from one that is already resolved.
fn explain_missed_outcome(
    connection: &mut PgConnection,
    id: NegotiationId,
) -> NegotiationRepositoryResult<NegotiationRepositoryError> {
    let exists: i64 = swap_negotiations::table
        .filter(swap_negotiations::id.eq(id.into_inner()))
        .count()
        .get_result(connection)
        .map_err(NegotiationRepositoryError::persistence)?;
    if exists == 0 {
        Ok(NegotiationRepositoryError::NotFound(id))
    } else {
        Ok(NegotiationRepositoryError::AlreadyResolved(id))
    }
}

fn to_new_row(negotiation: &SwapNegotiation) -> NewNegotiationRow {
    NewNegotiationRow {
        id: negotiation.id().into_inner(),
        proposer_id: negotiation.proposer_id().into_inner(),
        offered_slot_id: negotiation.offered_slot_id().into_inner(),
        requested_slot_id: negotiation.requested_slot_id().into_inner(),
        outcome: negotiation.outcome().as_str().to_owned(),
        created_at: negotiation.created_at(),
        resolved_at: negotiation.resolved_at(),
    }
}

fn row_to_negotiation(row: NegotiationRow) -> NegotiationRepositoryResult<SwapNegotiation> {
    let NegotiationRow {
        id,
        proposer_id,
        offered_slot_id,
        requested_slot_id,
        outcome,
        created_at,
        resolved_at,
    } = row;

    let parsed_outcome = SwapOutcome::try_from(outcome.as_str())
        .map_err(NegotiationRepositoryError::invalid_persisted_data)?;

    Ok(SwapNegotiation::from_persisted(PersistedNegotiationData {
        id: NegotiationId::from_uuid(id),
        proposer_id: UserId::from_uuid(proposer_id),
        offered_slot_id: SlotId::from_uuid(offered_slot_id),
        requested_slot_id: SlotId::from_uuid(requested_slot_id),
        outcome: parsed_outcome,
        created_at,
        resolved_at,
    }))
}
