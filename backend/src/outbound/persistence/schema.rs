//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. When a
//! migration changes a table, update the matching block here (or regenerate
//! it with `diesel print-schema`).

diesel::table! {
    /// Transactional outbox; drained per shard in ascending id order.
    outbox_records (id) {
        id -> Int8,
        /// Snake-case `OutboxScope` discriminator.
        shard_scope -> Varchar,
        shard_identifier -> Int8,
        /// Snake-case `OutboxCategory` discriminator.
        category -> Varchar,
        object_identifier -> Int8,
        /// Always a JSON object (enforced by a check constraint).
        payload -> Jsonb,
        scheduled_for -> Timestamptz,
    }
}

diesel::table! {
    /// Global slug reservations; `slug` and `organization_id` are unique.
    organization_mappings (id) {
        id -> Int8,
        organization_id -> Int8,
        slug -> Varchar,
        name -> Varchar,
        region_name -> Varchar,
        date_created -> Timestamptz,
        verified -> Bool,
        customer_id -> Nullable<Varchar>,
        /// Empty string when the creator supplied no key.
        idempotency_key -> Varchar,
        status -> Varchar,
    }
}

diesel::table! {
    /// Organization memberships and pending invites.
    organization_members (id) {
        id -> Int8,
        organization_id -> Int8,
        user_id -> Nullable<Int8>,
        email -> Nullable<Varchar>,
        role -> Varchar,
        flags -> Int8,
        invite_status -> Int2,
        token -> Nullable<Text>,
        token_expires_at -> Nullable<Timestamptz>,
        date_added -> Timestamptz,
        inviter_id -> Nullable<Int8>,
        has_global_access -> Bool,
        user_is_active -> Bool,
        user_email -> Nullable<Varchar>,
    }
}

diesel::table! {
    teams (id) {
        id -> Int8,
        organization_id -> Int8,
        slug -> Varchar,
        /// Organization role granted to every active team member.
        org_role -> Nullable<Varchar>,
    }
}

diesel::table! {
    organization_member_teams (id) {
        id -> Int8,
        organization_member_id -> Int8,
        team_id -> Int8,
        is_active -> Bool,
    }
}

diesel::joinable!(organization_member_teams -> organization_members (organization_member_id));
diesel::joinable!(organization_member_teams -> teams (team_id));

diesel::allow_tables_to_appear_in_same_query!(
    outbox_records,
    organization_mappings,
    organization_members,
    teams,
    organization_member_teams,
);
