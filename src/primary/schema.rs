//! DDL for the admin tables and the per-space primary data tables.
//!
//! Per-space tables carry the authoritative RDF data; the index provides
//! the query layer, so the quad table needs no secondary indexes.

/// Admin table DDL, in creation order.
pub fn admin_tables_sql() -> Vec<&'static str> {
    vec![
        "CREATE TABLE IF NOT EXISTS install (
            id SERIAL PRIMARY KEY,
            install_datetime TIMESTAMP,
            update_datetime TIMESTAMP,
            active BOOLEAN
        )",
        "CREATE TABLE IF NOT EXISTS space (
            space_id VARCHAR(255) PRIMARY KEY,
            space_name VARCHAR(255),
            space_description TEXT,
            tenant VARCHAR(255),
            update_time TIMESTAMP
        )",
        "CREATE TABLE IF NOT EXISTS graph (
            graph_id SERIAL PRIMARY KEY,
            space_id VARCHAR(255) NOT NULL,
            graph_uri VARCHAR(500),
            graph_name VARCHAR(255),
            created_time TIMESTAMP,
            FOREIGN KEY (space_id) REFERENCES space(space_id) ON DELETE CASCADE,
            UNIQUE (space_id, graph_uri)
        )",
        "CREATE TABLE IF NOT EXISTS \"user\" (
            user_id SERIAL PRIMARY KEY,
            username VARCHAR(255) UNIQUE NOT NULL,
            password VARCHAR(255),
            email VARCHAR(255),
            tenant VARCHAR(255),
            update_time TIMESTAMP
        )",
    ]
}

/// Admin index DDL.
pub fn admin_indexes_sql() -> Vec<&'static str> {
    vec![
        "CREATE INDEX IF NOT EXISTS idx_space_tenant ON space(tenant)",
        "CREATE INDEX IF NOT EXISTS idx_space_update_time ON space(update_time)",
        "CREATE INDEX IF NOT EXISTS idx_graph_space_id ON graph(space_id)",
        "CREATE INDEX IF NOT EXISTS idx_graph_uri ON graph(graph_uri)",
        "CREATE INDEX IF NOT EXISTS idx_user_tenant ON \"user\"(tenant)",
        "CREATE INDEX IF NOT EXISTS idx_user_username ON \"user\"(username)",
    ]
}

/// DDL for one space's primary data tables.
pub fn space_tables_sql(space_id: &str) -> Vec<String> {
    let prefix = format!("{space_id}_");
    vec![
        format!(
            "CREATE TABLE {prefix}term (
                term_uuid UUID NOT NULL,
                term_text TEXT NOT NULL,
                term_type CHAR(1) NOT NULL CHECK (term_type IN ('U', 'L', 'B', 'G')),
                lang VARCHAR(20),
                datatype_id BIGINT,
                created_time TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                dataset VARCHAR(50) NOT NULL DEFAULT 'primary',
                PRIMARY KEY (term_uuid, dataset)
            )"
        ),
        format!(
            "CREATE TABLE {prefix}rdf_quad (
                subject_uuid UUID NOT NULL,
                predicate_uuid UUID NOT NULL,
                object_uuid UUID NOT NULL,
                context_uuid UUID NOT NULL,
                quad_uuid UUID NOT NULL DEFAULT gen_random_uuid(),
                created_time TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                dataset VARCHAR(50) NOT NULL DEFAULT 'primary',
                FOREIGN KEY (subject_uuid, dataset) REFERENCES {prefix}term(term_uuid, dataset) ON DELETE CASCADE,
                FOREIGN KEY (predicate_uuid, dataset) REFERENCES {prefix}term(term_uuid, dataset) ON DELETE CASCADE,
                FOREIGN KEY (object_uuid, dataset) REFERENCES {prefix}term(term_uuid, dataset) ON DELETE CASCADE,
                FOREIGN KEY (context_uuid, dataset) REFERENCES {prefix}term(term_uuid, dataset) ON DELETE CASCADE,
                PRIMARY KEY (subject_uuid, predicate_uuid, object_uuid, context_uuid, quad_uuid, dataset)
            )"
        ),
    ]
}

/// DDL dropping one space's primary data tables.
pub fn drop_space_tables_sql(space_id: &str) -> Vec<String> {
    let prefix = format!("{space_id}_");
    vec![
        format!("DROP TABLE IF EXISTS {prefix}rdf_quad CASCADE"),
        format!("DROP TABLE IF EXISTS {prefix}term CASCADE"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_tables_cover_registry() {
        let ddl = admin_tables_sql().join("\n");
        assert!(ddl.contains("CREATE TABLE IF NOT EXISTS install"));
        assert!(ddl.contains("CREATE TABLE IF NOT EXISTS space"));
        assert!(ddl.contains("CREATE TABLE IF NOT EXISTS graph"));
        assert!(ddl.contains("UNIQUE (space_id, graph_uri)"));
        assert!(ddl.contains("\"user\""));
    }

    #[test]
    fn test_space_tables_are_prefixed() {
        let ddl = space_tables_sql("s1").join("\n");
        assert!(ddl.contains("CREATE TABLE s1_term"));
        assert!(ddl.contains("CREATE TABLE s1_rdf_quad"));
        assert!(ddl.contains("DEFAULT 'primary'"));
        assert!(ddl.contains("REFERENCES s1_term(term_uuid, dataset)"));
    }

    #[test]
    fn test_drop_order_is_quad_first() {
        let ddl = drop_space_tables_sql("s1");
        assert!(ddl[0].contains("s1_rdf_quad"));
        assert!(ddl[1].contains("s1_term"));
    }
}
