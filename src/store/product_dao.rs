//! Product persistence.

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::domain::{Product, ProductUsageStat};

use super::parse_column;

/// Columns in the order [`ProductDao::from_row`] reads them
pub(crate) const PRODUCT_COLUMNS: &str = "p.id, p.external_id, p.gateway_account_id, p.name, \
     p.description, p.price, p.pay_api_token, p.return_url, p.status, p.date_created";

/// Data access for the `products` table
pub struct ProductDao;

impl ProductDao {
    pub fn find_by_id(conn: &Connection, id: i64) -> rusqlite::Result<Option<Product>> {
        conn.query_row(
            &format!("SELECT {} FROM products p WHERE p.id = ?1", PRODUCT_COLUMNS),
            params![id],
            |row| Self::from_row(row, 0),
        )
        .optional()
    }

    pub fn find_by_external_id(
        conn: &Connection,
        external_id: &str,
    ) -> rusqlite::Result<Option<Product>> {
        conn.query_row(
            &format!("SELECT {} FROM products p WHERE p.external_id = ?1", PRODUCT_COLUMNS),
            params![external_id],
            |row| Self::from_row(row, 0),
        )
        .optional()
    }

    /// A product, only if it belongs to the given gateway account
    pub fn find_by_gateway_account_id_and_external_id(
        conn: &Connection,
        gateway_account_id: i64,
        external_id: &str,
    ) -> rusqlite::Result<Option<Product>> {
        conn.query_row(
            &format!(
                "SELECT {} FROM products p
                 WHERE p.gateway_account_id = ?1 AND p.external_id = ?2",
                PRODUCT_COLUMNS
            ),
            params![gateway_account_id, external_id],
            |row| Self::from_row(row, 0),
        )
        .optional()
    }

    /// Active products of a gateway account, oldest first
    pub fn find_by_gateway_account_id(
        conn: &Connection,
        gateway_account_id: i64,
    ) -> rusqlite::Result<Vec<Product>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM products p
             WHERE p.gateway_account_id = ?1 AND p.status = 'ACTIVE'
             ORDER BY p.id",
            PRODUCT_COLUMNS
        ))?;

        let products = stmt
            .query_map(params![gateway_account_id], |row| Self::from_row(row, 0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(products)
    }

    /// Insert a new product and record its generated id
    pub fn persist(conn: &Connection, product: &mut Product) -> rusqlite::Result<()> {
        conn.execute(
            "INSERT INTO products (external_id, gateway_account_id, name, description, price,
                                   pay_api_token, return_url, status, date_created)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                product.external_id,
                product.gateway_account_id,
                product.name,
                product.description,
                product.price,
                product.pay_api_token,
                product.return_url,
                product.status.as_str(),
                product.date_created.to_rfc3339(),
            ],
        )?;
        product.id = Some(conn.last_insert_rowid());
        Ok(())
    }

    /// Write back the mutable fields of an existing product
    pub fn merge(conn: &Connection, product: &Product) -> rusqlite::Result<()> {
        let updated = conn.execute(
            "UPDATE products
             SET name = ?2, description = ?3, price = ?4, pay_api_token = ?5,
                 return_url = ?6, status = ?7
             WHERE external_id = ?1",
            params![
                product.external_id,
                product.name,
                product.description,
                product.price,
                product.pay_api_token,
                product.return_url,
                product.status.as_str(),
            ],
        )?;

        if updated == 0 {
            return Err(rusqlite::Error::QueryReturnedNoRows);
        }
        Ok(())
    }

    /// Returns the number of rows removed. Metadata goes with the product;
    /// a product with payments cannot be deleted.
    pub fn delete_by_id(conn: &Connection, id: i64) -> rusqlite::Result<usize> {
        conn.execute("DELETE FROM products WHERE id = ?1", params![id])
    }

    /// Payment counts for every product paid at least once, optionally
    /// limited to one gateway account
    pub fn usage_stats(
        conn: &Connection,
        gateway_account_id: Option<i64>,
    ) -> rusqlite::Result<Vec<ProductUsageStat>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT COUNT(pay.id), MAX(pay.date_created), {}
             FROM products p
             JOIN payments pay ON pay.product_id = p.id
             WHERE ?1 IS NULL OR p.gateway_account_id = ?1
             GROUP BY p.id
             ORDER BY p.id",
            PRODUCT_COLUMNS
        ))?;

        let stats = stmt
            .query_map(params![gateway_account_id], |row| {
                Ok(ProductUsageStat {
                    payment_count: row.get(0)?,
                    last_payment_date: parse_column(1, row.get(1)?)?,
                    product: Self::from_row(row, 2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(stats)
    }

    /// Read a product from `row`, starting at column `offset`
    pub(crate) fn from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<Product> {
        Ok(Product {
            id: Some(row.get(offset)?),
            external_id: row.get(offset + 1)?,
            gateway_account_id: row.get(offset + 2)?,
            name: row.get(offset + 3)?,
            description: row.get(offset + 4)?,
            price: row.get(offset + 5)?,
            pay_api_token: row.get(offset + 6)?,
            return_url: row.get(offset + 7)?,
            status: parse_column(offset + 8, row.get(offset + 8)?)?,
            date_created: parse_column(offset + 9, row.get(offset + 9)?)?,
            links: Vec::new(),
        })
    }
}
