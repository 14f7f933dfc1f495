//! Diesel schema for slot persistence.

diesel::table! {
    /// Calendar slot records.
    slots (id) {
        /// Slot identifier.
        id -> Uuid,
        /// Current owner identity.
        owner_id -> Uuid,
        /// Human-readable title.
        #[max_length = 200]
        title -> Varchar,
        /// Inclusive window start.
        starts_at -> Timestamptz,
        /// Exclusive window end.
        ends_at -> Timestamptz,
        /// Tradability status (busy, tradable, or pending_swap).
        #[max_length = 50]
        status -> Varchar,
        /// Negotiation lock token while pending a swap.
        swap_lock -> Nullable<Uuid>,
        /// Optimistic concurrency revision.
        revision -> Int8,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}
