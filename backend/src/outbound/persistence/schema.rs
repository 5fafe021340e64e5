//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the database migrations exactly. They are
//! used by Diesel for compile-time query validation and type-safe SQL
//! generation.

diesel::table! {
    /// Family groups sharing one item list.
    families (id) {
        /// Primary key allocated by the database.
        id -> Int4,
        /// Eight-character join token shared between members.
        invite_code -> Varchar,
        /// Current owner, when one is set.
        owner_id -> Nullable<Int8>,
    }
}

diesel::table! {
    /// Registered users with presence bookkeeping.
    users (id) {
        /// Externally issued identifier; primary key.
        id -> Int8,
        /// Display name, when the provider supplied one.
        username -> Nullable<Text>,
        /// Avatar reference, when the provider supplied one.
        photo_url -> Nullable<Text>,
        /// The family the user currently belongs to.
        family_id -> Int4,
        /// Timestamp of the most recent authentication.
        last_seen -> Nullable<Timestamptz>,
        /// Cumulative number of authentications.
        visit_count -> Int8,
    }
}

diesel::table! {
    /// Shopping-list items, keyed by client-supplied identifier.
    items (id) {
        /// Client-supplied identifier; primary key.
        id -> Varchar,
        /// Free-text label.
        text -> Text,
        /// Whether the item has been purchased.
        is_bought -> Bool,
        /// Category label.
        category -> Text,
        /// Owning family, fixed at creation.
        family_id -> Int4,
    }
}

diesel::joinable!(users -> families (family_id));
diesel::joinable!(items -> families (family_id));

diesel::allow_tables_to_appear_in_same_query!(families, users, items);
