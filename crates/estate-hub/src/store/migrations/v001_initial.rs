use rusqlite::Connection;

const UP_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    first_name        TEXT NOT NULL,
    last_name         TEXT NOT NULL,
    email             TEXT NOT NULL UNIQUE,
    password          TEXT NOT NULL,
    phone             TEXT,
    user_type         TEXT NOT NULL,
    role              TEXT NOT NULL DEFAULT 'USER',
    subscription_type TEXT NOT NULL DEFAULT 'FREE',
    company           TEXT,
    license_number    TEXT,
    bio               TEXT,
    profile_image_url TEXT,
    active            INTEGER NOT NULL DEFAULT 1,
    created_at        TEXT NOT NULL,
    updated_at        TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS builder_groups (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL,
    description TEXT,
    active      INTEGER NOT NULL DEFAULT 1,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

-- price and square_feet hold decimal text; compare through CAST(... AS REAL)
CREATE TABLE IF NOT EXISTS properties (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    title            TEXT NOT NULL,
    description      TEXT,
    price            TEXT NOT NULL,
    address          TEXT NOT NULL,
    city             TEXT NOT NULL,
    state            TEXT NOT NULL,
    zip_code         TEXT,
    property_type    TEXT NOT NULL,
    listing_type     TEXT NOT NULL,
    bedrooms         INTEGER,
    bathrooms        INTEGER,
    square_feet      TEXT,
    year_built       INTEGER,
    available        INTEGER NOT NULL DEFAULT 1,
    owner_id         INTEGER REFERENCES users(id) ON DELETE SET NULL,
    builder_group_id INTEGER REFERENCES builder_groups(id) ON DELETE SET NULL,
    created_at       TEXT NOT NULL,
    updated_at       TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS ix_properties_available ON properties(available);
CREATE INDEX IF NOT EXISTS ix_properties_owner ON properties(owner_id);

CREATE TABLE IF NOT EXISTS property_images (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    property_id   INTEGER NOT NULL REFERENCES properties(id) ON DELETE CASCADE,
    image_url     TEXT NOT NULL,
    caption       TEXT,
    is_primary    INTEGER NOT NULL DEFAULT 0,
    display_order INTEGER NOT NULL,
    uploaded_at   TEXT NOT NULL,

    UNIQUE (property_id, display_order)
);

CREATE TABLE IF NOT EXISTS favorites (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    property_id INTEGER NOT NULL REFERENCES properties(id) ON DELETE CASCADE,
    notes       TEXT,
    created_at  TEXT NOT NULL,

    UNIQUE (user_id, property_id)
);

CREATE INDEX IF NOT EXISTS ix_favorites_property ON favorites(property_id);

CREATE TABLE IF NOT EXISTS schedule_viewings (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id          INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    property_id      INTEGER NOT NULL REFERENCES properties(id) ON DELETE CASCADE,
    viewing_date     TEXT NOT NULL,
    viewing_time     TEXT NOT NULL,
    status           TEXT NOT NULL DEFAULT 'PENDING'
                     CHECK (status IN ('PENDING', 'CONFIRMED', 'REJECTED', 'COMPLETED', 'CANCELLED')),
    notes            TEXT,
    rejection_reason TEXT,
    created_at       TEXT NOT NULL,
    confirmed_at     TEXT,
    rejected_at      TEXT,
    completed_at     TEXT,
    cancelled_at     TEXT
);

-- one active viewing per property per day
CREATE UNIQUE INDEX IF NOT EXISTS ux_viewings_active_slot
    ON schedule_viewings(property_id, viewing_date)
    WHERE status IN ('PENDING', 'CONFIRMED');

CREATE INDEX IF NOT EXISTS ix_viewings_user ON schedule_viewings(user_id);

CREATE TABLE IF NOT EXISTS contact_agents (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id         INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    property_id     INTEGER NOT NULL REFERENCES properties(id) ON DELETE CASCADE,
    subject         TEXT NOT NULL,
    message         TEXT NOT NULL,
    sender_name     TEXT NOT NULL,
    sender_email    TEXT NOT NULL,
    sender_phone    TEXT,
    additional_info TEXT,
    is_read         INTEGER NOT NULL DEFAULT 0,
    created_at      TEXT NOT NULL,
    responded_at    TEXT
);

CREATE TABLE IF NOT EXISTS subscriptions (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id        INTEGER NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
    plan_type      TEXT NOT NULL,
    start_date     TEXT NOT NULL,
    end_date       TEXT,
    price          TEXT NOT NULL,
    active         INTEGER NOT NULL DEFAULT 1,
    auto_renew     INTEGER NOT NULL DEFAULT 0,
    payment_method TEXT,
    transaction_id TEXT,
    created_at     TEXT NOT NULL,
    updated_at     TEXT NOT NULL,

    CHECK (end_date IS NOT NULL OR plan_type = 'FREE')
);

CREATE TABLE IF NOT EXISTS search_history (
    id                   INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id              INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    search_keyword       TEXT,
    search_city          TEXT,
    search_state         TEXT,
    search_property_type TEXT,
    search_listing_type  TEXT,
    min_price            TEXT,
    max_price            TEXT,
    min_bedrooms         INTEGER,
    max_bedrooms         INTEGER,
    min_bathrooms        INTEGER,
    max_bathrooms        INTEGER,
    min_square_feet      TEXT,
    max_square_feet      TEXT,
    results_count        INTEGER NOT NULL,
    searched_at          TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS ix_search_history_user ON search_history(user_id);
"#;

pub fn up(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(UP_SQL)
}
