//! Diesel schema for negotiation persistence.

diesel::table! {
    /// Swap negotiation records.
    swap_negotiations (id) {
        /// Negotiation identifier.
        id -> Uuid,
        /// User who opened the negotiation.
        proposer_id -> Uuid,
        /// Slot offered by the proposer.
        offered_slot_id -> Uuid,
        /// Slot requested in return.
        requested_slot_id -> Uuid,
        /// Outcome (pending, accepted, or rejected).
        #[max_length = 50]
        outcome -> Varchar,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Resolution timestamp.
        resolved_at -> Nullable<Timestamptz>,
    }
}
