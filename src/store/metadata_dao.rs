//! Product metadata persistence.
//!
//! Keys are stored `COLLATE NOCASE`, so lookups and the per-product unique
//! constraint ignore case.

use rusqlite::{params, Connection};

use crate::domain::ProductMetadata;

/// Data access for the `product_metadata` table
pub struct ProductMetadataDao;

impl ProductMetadataDao {
    /// Pairs of a product, in insertion order
    pub fn find_by_product_id(
        conn: &Connection,
        product_id: i64,
    ) -> rusqlite::Result<Vec<ProductMetadata>> {
        let mut stmt = conn.prepare(
            "SELECT metadata_key, metadata_value FROM product_metadata
             WHERE product_id = ?1
             ORDER BY id",
        )?;

        let metadata = stmt
            .query_map(params![product_id], |row| {
                Ok(ProductMetadata::new(
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(metadata)
    }

    pub fn persist(
        conn: &Connection,
        product_id: i64,
        metadata: &ProductMetadata,
    ) -> rusqlite::Result<()> {
        conn.execute(
            "INSERT INTO product_metadata (product_id, metadata_key, metadata_value)
             VALUES (?1, ?2, ?3)",
            params![product_id, metadata.key, metadata.value],
        )?;
        Ok(())
    }

    /// Replace the value of an existing key. Returns the number of rows changed.
    pub fn update(
        conn: &Connection,
        product_id: i64,
        metadata: &ProductMetadata,
    ) -> rusqlite::Result<usize> {
        conn.execute(
            "UPDATE product_metadata SET metadata_value = ?3
             WHERE product_id = ?1 AND metadata_key = ?2",
            params![product_id, metadata.key, metadata.value],
        )
    }

    /// Returns the number of rows removed
    pub fn delete(conn: &Connection, product_id: i64, key: &str) -> rusqlite::Result<usize> {
        conn.execute(
            "DELETE FROM product_metadata WHERE product_id = ?1 AND metadata_key = ?2",
            params![product_id, key],
        )
    }
}
