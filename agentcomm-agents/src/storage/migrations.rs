use rusqlite::Connection;

/// Run all database migrations
pub fn run_migrations(conn: &Connection) -> anyhow::Result<()> {
    // Create agent_communications table
    conn.execute(
        "CREATE TABLE IF NOT EXISTS agent_communications (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            delegation_token_id VARCHAR NOT NULL UNIQUE,
            from_agent VARCHAR NOT NULL,
            to_agent VARCHAR NOT NULL,
            email_content VARCHAR NOT NULL,
            parsed_info VARCHAR NOT NULL,
            calendar_event VARCHAR,
            user_consent_given BOOLEAN,
            processing_status VARCHAR NOT NULL DEFAULT 'pending' CHECK (processing_status IN ('pending', 'processing', 'completed', 'failed')),
            created_at BIGINT NOT NULL,
            updated_at BIGINT NOT NULL
        )",
        [],
    )?;

    // Create indexes for performance
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_agent_communications_created_at
         ON agent_communications(created_at)",
        [],
    )?;

    Ok(())
}
