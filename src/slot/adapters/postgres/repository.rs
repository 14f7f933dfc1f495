//! `PostgreSQL` repository implementation for slot storage.

use super::{
    models::{NewSlotRow, SlotChangeset, SlotRow},
    schema::slots,
};
use crate::slot::{
    domain::{
        PersistedSlotData, Slot, SlotId, SlotRevision, SlotStatus, SlotTitle, SwapLock,
        TimeWindow, UserId,
    },
    ports::{SlotPairUpdate, SlotRepository, SlotRepositoryError, SlotRepositoryResult},
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type used by slot adapters.
pub type SlotPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed slot repository.
///
/// Revision checks are expressed as `UPDATE ... WHERE revision = $expected`,
/// so a concurrent writer can never be silently overwritten. Paired
/// replacements run inside one transaction.
#[derive(Debug, Clone)]
pub struct PostgresSlotRepository {
    pool: SlotPgPool,
}

impl PostgresSlotRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: SlotPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> SlotRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> SlotRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(SlotRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(SlotRepositoryError::persistence)?
    }
}

impl From<DieselError> for SlotRepositoryError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

#[async_trait]
impl SlotRepository for PostgresSlotRepository {
    async fn store(&self, slot: &Slot) -> SlotRepositoryResult<()> {
        let slot_id = slot.id();
        let new_row = to_new_row(slot)?;

        self.run_blocking(move |connection| {
            diesel::insert_into(slots::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        SlotRepositoryError::DuplicateSlot(slot_id)
                    }
                    _ => SlotRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: SlotId) -> SlotRepositoryResult<Option<Slot>> {
        self.run_blocking(move |connection| {
            let row = slots::table
                .filter(slots::id.eq(id.into_inner()))
                .select(SlotRow::as_select())
                .first::<SlotRow>(connection)
                .optional()
                .map_err(SlotRepositoryError::persistence)?;
            row.map(row_to_slot).transpose()
        })
        .await
    }

    async fn list_by_owner(&self, owner_id: UserId) -> SlotRepositoryResult<Vec<Slot>> {
        self.run_blocking(move |connection| {
            let rows = slots::table
                .filter(slots::owner_id.eq(owner_id.into_inner()))
                .order((slots::starts_at.asc(), slots::id.asc()))
                .select(SlotRow::as_select())
                .load::<SlotRow>(connection)
                .map_err(SlotRepositoryError::persistence)?;
            rows.into_iter().map(row_to_slot).collect()
        })
        .await
    }

    async fn list_by_status(&self, status: SlotStatus) -> SlotRepositoryResult<Vec<Slot>> {
        self.run_blocking(move |connection| {
            let rows = slots::table
                .filter(slots::status.eq(status.as_str()))
                .order((slots::starts_at.asc(), slots::id.asc()))
                .select(SlotRow::as_select())
                .load::<SlotRow>(connection)
                .map_err(SlotRepositoryError::persistence)?;
            rows.into_iter().map(row_to_slot).collect()
        })
        .await
    }

    async fn replace(&self, slot: &Slot, expected: SlotRevision) -> SlotRepositoryResult<()> {
        let slot_id = slot.id();
        let changeset = to_changeset(slot)?;

        self.run_blocking(move |connection| {
            apply_changeset(connection, slot_id, expected, &changeset)
        })
        .await
    }

    async fn replace_pair(
        &self,
        first: (&Slot, SlotRevision),
        second: (&Slot, SlotRevision),
    ) -> SlotRepositoryResult<()> {
        let (first_slot, first_expected) = first;
        let (second_slot, second_expected) = second;
        let first_id = first_slot.id();
        let second_id = second_slot.id();
        let first_changes = to_changeset(first_slot)?;
        let second_changes = to_changeset(second_slot)?;

        self.run_blocking(move |connection| {
            connection.transaction::<_, SlotRepositoryError, _>(|tx_conn| {
                apply_changeset(tx_conn, first_id, first_expected, &first_changes)?;
                apply_changeset(tx_conn, second_id, second_expected, &second_changes)?;
                Ok(())
            })
        })
        .await
    }

    async fn remove(&self, id: SlotId, expected: SlotRevision) -> SlotRepositoryResult<()> {
        self.run_blocking(move |connection| {
            let expected_value = revision_to_i64(expected)?;
            let deleted = diesel::delete(
                slots::table
                    .filter(slots::id.eq(id.into_inner()))
                    .filter(slots::revision.eq(expected_value)),
            )
            .execute(connection)
            .map_err(SlotRepositoryError::persistence)?;
            if deleted == 0 {
                return Err(explain_missed_write(connection, id, expected)?);
            }
            Ok(())
        })
        .await
    }
}

/// Applies both writes of `update` on `connection`.
///
/// Callers run this inside a transaction that also covers their own writes.
pub(crate) fn apply_pair_update(
    connection: &mut PgConnection,
    update: &SlotPairUpdate,
) -> SlotRepositoryResult<()> {
    for (slot, expected) in [update.first(), update.second()] {
        let changeset = to_changeset(slot)?;
        apply_changeset(connection, slot.id(), expected, &changeset)?;
    }
    Ok(())
}

/// Applies a guarded update and reports why it missed when no row matched.
fn apply_changeset(
    connection: &mut PgConnection,
    id: SlotId,
    expected: SlotRevision,
    changeset: &SlotChangeset,
) -> SlotRepositoryResult<()> {
    let expected_value = revision_to_i64(expected)?;
    let updated = diesel::update(
        slots::table
            .filter(slots::id.eq(id.into_inner()))
            .filter(slots::revision.eq(expected_value)),
    )
    .set(changeset)
    .execute(connection)
    .map_err(SlotRepositoryError::persistence)?;

    if updated == 0 {
        return Err(explain_missed_write(connection, id, expected)?);
    }
    Ok(())
}

/// Distinguishes a missing slot from a concurrent modification.
fn explain_missed_write(
    connection: &mut PgConnection,
    id: SlotId,
    expected: SlotRevision,
) -> SlotRepositoryResult<SlotRepositoryError> {
    let exists: i64 = slots::table
        .filter(slots::id.eq(id.into_inner()))
        .count()
        .get_result(connection)
        .map_err(SlotRepositoryError::persistence)?;

    if exists == 0 {
        Ok(SlotRepositoryError::NotFound(id))
    } else {
        Ok(SlotRepositoryError::RevisionConflict { id, expected })
    }
}

fn revision_to_i64(revision: SlotRevision) -> SlotRepositoryResult<i64> {
    i64::try_from(revision.value()).map_err(SlotRepositoryError::persistence)
}

fn to_new_row(slot: &Slot) -> SlotRepositoryResult<NewSlotRow> {
    Ok(NewSlotRow {
        id: slot.id().into_inner(),
        owner_id: slot.owner_id().into_inner(),
        title: slot.title().as_str().to_owned(),
        starts_at: slot.window().start(),
        ends_at: slot.window().end(),
        status: slot.status().as_str().to_owned(),
        swap_lock: slot.swap_lock().map(SwapLock::into_inner),
        revision: revision_to_i64(slot.revision())?,
        created_at: slot.created_at(),
        updated_at: slot.updated_at(),
    })
}

fn to_changeset(slot: &Slot) -> SlotRepositoryResult<SlotChangeset> {
    Ok(SlotChangeset {
        owner_id: slot.owner_id().into_inner(),
        title: slot.title().as_str().to_owned(),
        starts_at: slot.window().start(),
        ends_at: slot.window().end(),
        status: slot.status().as_str().to_owned(),
        swap_lock: slot.swap_lock().map(SwapLock::into_inner),
        revision: revision_to_i64(slot.revision())?,
        updated_at: slot.updated_at(),
    })
}

fn row_to_slot(row: SlotRow) -> SlotRepositoryResult<Slot> {
    let SlotRow {
        id,
        owner_id,
        title,
        starts_at,
        ends_at,
        status,
        swap_lock,
        revision,
        created_at,
        updated_at,
    } = row;

    let parsed_title = SlotTitle::new(title).map_err(SlotRepositoryError::invalid_persisted_data)?;
    let parsed_window =
        TimeWindow::new(starts_at, ends_at).map_err(SlotRepositoryError::invalid_persisted_data)?;
    let parsed_status =
        SlotStatus::try_from(status.as_str()).map_err(SlotRepositoryError::invalid_persisted_data)?;
    let parsed_revision =
        u64::try_from(revision).map_err(SlotRepositoryError::invalid_persisted_data)?;

    let data = PersistedSlotData {
        id: SlotId::from_uuid(id),
        owner_id: UserId::from_uuid(owner_id),
        title: parsed_title,
        window: parsed_window,
        status: parsed_status,
        swap_lock: swap_lock.map(SwapLock::from_uuid),
        revision: SlotRevision::new(parsed_revision),
        created_at,
        updated_at,
    };
    Ok(Slot::from_persisted(data))
}
