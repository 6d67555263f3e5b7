//! ScyllaDB schema creation
//!
//! Timestamps are BIGINT epoch milliseconds.

use crate::error::PersistenceError;
use scylla::Session;

/// Create the keyspace if it doesn't exist
pub async fn create_keyspace(
    session: &Session,
    keyspace: &str,
    replication_factor: u8,
) -> Result<(), PersistenceError> {
    let query = format!(
        "CREATE KEYSPACE IF NOT EXISTS {} WITH replication = {{'class': 'SimpleStrategy', 'replication_factor': {}}}",
        keyspace, replication_factor
    );

    session
        .query_unpaged(query, &[])
        .await
        .map_err(|e| PersistenceError::SchemaError(format!("Failed to create keyspace: {}", e)))?;

    Ok(())
}

/// (table name, CQL body with `{ks}` placeholder)
const TABLES: &[(&str, &str)] = &[
    (
        "accounts",
        r#"CREATE TABLE IF NOT EXISTS {ks}.accounts (
            service TEXT,
            contract_number TEXT,
            contract_lead TEXT,
            customer_name TEXT,
            address TEXT,
            phone TEXT,
            zone_id INT,
            is_paid BOOLEAN,
            outstanding_balance DOUBLE,
            last_payment_ms BIGINT,
            cut_status TEXT,
            cut_reason TEXT,
            PRIMARY KEY ((service, contract_number))
        )"#,
    ),
    // CQL has no LIKE on keys; leading-segment lookups go through this index table
    (
        "account_prefixes",
        r#"CREATE TABLE IF NOT EXISTS {ks}.account_prefixes (
            service TEXT,
            contract_prefix TEXT,
            contract_number TEXT,
            PRIMARY KEY ((service, contract_prefix), contract_number)
        )"#,
    ),
    (
        "zones",
        r#"CREATE TABLE IF NOT EXISTS {ks}.zones (
            zone_id INT,
            name TEXT,
            maintenance_status TEXT,
            outage_reason TEXT,
            estimated_restoration TEXT,
            affected_services SET<TEXT>,
            status_updated_ms BIGINT,
            PRIMARY KEY (zone_id)
        )"#,
    ),
    (
        "conversations",
        r#"CREATE TABLE IF NOT EXISTS {ks}.conversations (
            conversation_id TEXT,
            created_at_ms BIGINT,
            PRIMARY KEY (conversation_id)
        )"#,
    ),
    (
        "conversation_turns",
        r#"CREATE TABLE IF NOT EXISTS {ks}.conversation_turns (
            conversation_id TEXT,
            seq BIGINT,
            role TEXT,
            content TEXT,
            timestamp_ms BIGINT,
            metadata_json TEXT,
            PRIMARY KEY ((conversation_id), seq)
        ) WITH CLUSTERING ORDER BY (seq ASC)"#,
    ),
];

/// Create all required tables
pub async fn create_tables(session: &Session, keyspace: &str) -> Result<(), PersistenceError> {
    for (name, cql) in TABLES {
        let query = cql.replace("{ks}", keyspace);
        session.query_unpaged(query, &[]).await.map_err(|e| {
            PersistenceError::SchemaError(format!("Failed to create {} table: {}", name, e))
        })?;
    }

    tracing::info!(tables = TABLES.len(), "All tables created successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_definitions_use_keyspace_placeholder() {
        for (name, cql) in TABLES {
            let rendered = cql.replace("{ks}", "utility_agent");
            assert!(rendered.contains(&format!("utility_agent.{}", name)));
        }
    }
}
