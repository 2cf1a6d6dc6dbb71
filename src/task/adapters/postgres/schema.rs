//! Diesel schema for board and task persistence.

diesel::table! {
    /// Boards, the scoping unit for task positions.
    boards (id) {
        /// Board identifier.
        id -> Uuid,
        /// Owning project identifier.
        project_id -> Uuid,
    }
}

diesel::table! {
    /// Task records with their board placement.
    tasks (id) {
        /// Task identifier.
        id -> Uuid,
        /// Owning board.
        board_id -> Uuid,
        /// Optional owning user.
        owner_id -> Nullable<Uuid>,
        /// Zero-based position, unique per board (deferred constraint).
        position -> Int4,
        /// Task title.
        #[max_length = 255]
        title -> Varchar,
        /// Optional description.
        description -> Nullable<Text>,
        /// Optional start date.
        start_date -> Nullable<Timestamptz>,
        /// Optional end date.
        end_date -> Nullable<Timestamptz>,
        /// Completion timestamp, set iff the task is complete.
        completed_at -> Nullable<Timestamptz>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(tasks -> boards (board_id));
diesel::allow_tables_to_appear_in_same_query!(boards, tasks);
