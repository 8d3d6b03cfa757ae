//! Payment persistence.

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::domain::Payment;

use super::parse_column;
use super::product_dao::{ProductDao, PRODUCT_COLUMNS};

const PAYMENT_COLUMNS: &str =
    "pay.id, pay.external_id, pay.govuk_payment_id, pay.next_url, pay.status, pay.date_created";

/// Number of payment columns preceding the product columns in a joined row
const PRODUCT_OFFSET: usize = 6;

/// Data access for the `payments` table
pub struct PaymentDao;

impl PaymentDao {
    pub fn find_by_id(conn: &Connection, id: i64) -> rusqlite::Result<Option<Payment>> {
        conn.query_row(
            &Self::select_where("pay.id = ?1"),
            params![id],
            Self::from_row,
        )
        .optional()
    }

    pub fn find_by_external_id(
        conn: &Connection,
        external_id: &str,
    ) -> rusqlite::Result<Option<Payment>> {
        conn.query_row(
            &Self::select_where("pay.external_id = ?1"),
            params![external_id],
            Self::from_row,
        )
        .optional()
    }

    /// Insert a new payment and record its generated id.
    ///
    /// The owning product must already be persisted.
    pub fn persist(conn: &Connection, payment: &mut Payment) -> rusqlite::Result<()> {
        conn.execute(
            "INSERT INTO payments (external_id, govuk_payment_id, next_url, status,
                                   product_id, date_created)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                payment.external_id,
                payment.govuk_payment_id,
                payment.next_url,
                payment.status.as_str(),
                payment.product.id,
                payment.date_created.to_rfc3339(),
            ],
        )?;
        payment.id = Some(conn.last_insert_rowid());
        Ok(())
    }

    /// Write back status and gateway-issued fields of an existing payment
    pub fn merge(conn: &Connection, payment: &Payment) -> rusqlite::Result<()> {
        let updated = conn.execute(
            "UPDATE payments
             SET govuk_payment_id = ?2, next_url = ?3, status = ?4
             WHERE external_id = ?1",
            params![
                payment.external_id,
                payment.govuk_payment_id,
                payment.next_url,
                payment.status.as_str(),
            ],
        )?;

        if updated == 0 {
            return Err(rusqlite::Error::QueryReturnedNoRows);
        }
        Ok(())
    }

    fn select_where(condition: &str) -> String {
        format!(
            "SELECT {}, {} FROM payments pay
             JOIN products p ON p.id = pay.product_id
             WHERE {}",
            PAYMENT_COLUMNS, PRODUCT_COLUMNS, condition
        )
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Payment> {
        Ok(Payment {
            id: Some(row.get(0)?),
            external_id: row.get(1)?,
            govuk_payment_id: row.get(2)?,
            next_url: row.get(3)?,
            status: parse_column(4, row.get(4)?)?,
            date_created: parse_column(5, row.get(5)?)?,
            product: ProductDao::from_row(row, PRODUCT_OFFSET)?,
            links: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PaymentStatus, Product};
    use crate::store::create_schema;

    fn connection_with_product() -> (Connection, Product) {
        let conn = Connection::open_in_memory().unwrap();
        create_schema(&conn).unwrap();
        conn.pragma_update(None, "foreign_keys", true).unwrap();

        let mut product =
            Product::new(1, "P1".to_string(), "Fee".to_string(), 1050, "token".to_string());
        ProductDao::persist(&conn, &mut product).unwrap();
        (conn, product)
    }

    #[test]
    fn test_persist_and_find_with_product() {
        let (conn, product) = connection_with_product();
        let mut payment = Payment::new("pay-1".to_string(), product.clone());
        PaymentDao::persist(&conn, &mut payment).unwrap();

        let found = PaymentDao::find_by_external_id(&conn, "pay-1").unwrap().unwrap();
        assert_eq!(found.id, payment.id);
        assert_eq!(found.status, PaymentStatus::Created);
        assert_eq!(found.product, product);

        let by_id = PaymentDao::find_by_id(&conn, payment.id.unwrap()).unwrap();
        assert_eq!(by_id, Some(found));
    }

    #[test]
    fn test_merge_records_gateway_outcome() {
        let (conn, product) = connection_with_product();
        let mut payment = Payment::new("pay-1".to_string(), product);
        PaymentDao::persist(&conn, &mut payment).unwrap();

        payment.mark_succeeded("G1".to_string(), "https://next.url".to_string());
        PaymentDao::merge(&conn, &payment).unwrap();

        let found = PaymentDao::find_by_external_id(&conn, "pay-1").unwrap().unwrap();
        assert_eq!(found.status, PaymentStatus::Succeeded);
        assert_eq!(found.govuk_payment_id.as_deref(), Some("G1"));
        assert_eq!(found.next_url.as_deref(), Some("https://next.url"));
    }

    #[test]
    fn test_persist_requires_persisted_product() {
        let (conn, _) = connection_with_product();
        let unsaved = Product::new(1, "P2".to_string(), "Fee".to_string(), 1, "t".to_string());
        let mut payment = Payment::new("pay-2".to_string(), unsaved);

        assert!(PaymentDao::persist(&conn, &mut payment).is_err());
    }
}
