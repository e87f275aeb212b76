//! PostgreSQL DDL for identities, key bindings and linking tokens.
//!
//! `public_key` and `token` carry UNIQUE constraints: they are what makes
//! concurrent binds of one key resolve to a single winner.

pub const CREATE_IDENTITIES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS identities_tb (
    identity_id BIGSERIAL PRIMARY KEY,
    name        VARCHAR(64) NOT NULL UNIQUE,
    created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

pub const CREATE_KEY_BINDINGS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS key_bindings_tb (
    binding_id  BIGSERIAL PRIMARY KEY,
    identity_id BIGINT NOT NULL REFERENCES identities_tb(identity_id) ON DELETE CASCADE,
    public_key  TEXT NOT NULL UNIQUE,
    created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

pub const CREATE_KEY_BINDINGS_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_key_bindings_identity ON key_bindings_tb(identity_id)
"#;

pub const CREATE_LINKING_TOKENS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS linking_tokens_tb (
    token_id      BIGSERIAL PRIMARY KEY,
    identity_id   BIGINT NOT NULL REFERENCES identities_tb(identity_id) ON DELETE CASCADE,
    token         TEXT NOT NULL UNIQUE,
    expires_at_ms BIGINT NOT NULL,
    created_at    TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

pub const CREATE_LINKING_TOKENS_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_linking_tokens_identity ON linking_tokens_tb(identity_id)
"#;

/// Statements in execution order, with a name for logging.
pub const STATEMENTS: [(&str, &str); 5] = [
    ("identities_tb", CREATE_IDENTITIES_TABLE),
    ("key_bindings_tb", CREATE_KEY_BINDINGS_TABLE),
    ("idx_key_bindings_identity", CREATE_KEY_BINDINGS_INDEX),
    ("linking_tokens_tb", CREATE_LINKING_TOKENS_TABLE),
    ("idx_linking_tokens_identity", CREATE_LINKING_TOKENS_INDEX),
];
