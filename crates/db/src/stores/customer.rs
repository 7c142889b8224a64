use sqlx::{sqlite::SqliteRow, Row};

use garasi_core::domain::customer::{
    Customer, CustomerId, InteractionEntry, LeadStatus, PhoneNumber, SummaryStats,
};

use super::{CustomerStore, StoreError};
use crate::stores::vehicle::datetime_from_raw;
use crate::DbPool;

pub struct SqlCustomerStore {
    pool: DbPool,
}

impl SqlCustomerStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const SELECT_CUSTOMER: &str = "SELECT id, name, phone, status, last_activity, \
     total_interactions, history, summary, created_at FROM customer";

const UPSERT_CUSTOMER: &str = "INSERT INTO customer (
        id, name, phone, status, last_activity, total_interactions, history, summary, created_at
     ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
     ON CONFLICT(id) DO UPDATE SET
        name = excluded.name,
        phone = excluded.phone,
        status = excluded.status,
        last_activity = excluded.last_activity,
        total_interactions = excluded.total_interactions,
        history = excluded.history,
        summary = excluded.summary";

#[async_trait::async_trait]
impl CustomerStore for SqlCustomerStore {
    async fn find_by_phone(&self, phone: &PhoneNumber) -> Result<Option<Customer>, StoreError> {
        let row = sqlx::query(&format!("{SELECT_CUSTOMER} WHERE phone = ?"))
            .bind(&phone.0)
            .fetch_optional(&self.pool)
            .await?;
        row.map(customer_from_row).transpose()
    }

    async fn find_by_id(&self, id: &CustomerId) -> Result<Option<Customer>, StoreError> {
        let row = sqlx::query(&format!("{SELECT_CUSTOMER} WHERE id = ?"))
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;
        row.map(customer_from_row).transpose()
    }

    async fn insert(&self, customer: Customer) -> Result<(), StoreError> {
        let (history, summary) = encode_profile(&customer)?;
        let result = sqlx::query(
            "INSERT INTO customer (
                id, name, phone, status, last_activity, total_interactions, history, summary,
                created_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&customer.id.0)
        .bind(&customer.name)
        .bind(&customer.phone.0)
        .bind(customer.status.label())
        .bind(customer.last_activity.to_rfc3339())
        .bind(i64::from(customer.total_interactions))
        .bind(history)
        .bind(summary)
        .bind(customer.created_at.to_rfc3339())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_error)) if db_error.is_unique_violation() => {
                Err(StoreError::DuplicateKey(customer.phone.0))
            }
            Err(error) => Err(error.into()),
        }
    }

    async fn save(&self, customer: Customer) -> Result<(), StoreError> {
        let (history, summary) = encode_profile(&customer)?;
        sqlx::query(UPSERT_CUSTOMER)
            .bind(&customer.id.0)
            .bind(&customer.name)
            .bind(&customer.phone.0)
            .bind(customer.status.label())
            .bind(customer.last_activity.to_rfc3339())
            .bind(i64::from(customer.total_interactions))
            .bind(history)
            .bind(summary)
            .bind(customer.created_at.to_rfc3339())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_by_last_activity(&self) -> Result<Vec<Customer>, StoreError> {
        let rows = sqlx::query(&format!("{SELECT_CUSTOMER} ORDER BY last_activity DESC"))
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(customer_from_row).collect()
    }
}

fn encode_profile(customer: &Customer) -> Result<(String, String), StoreError> {
    let history = serde_json::to_string(&customer.history)
        .map_err(|error| StoreError::Decode(error.to_string()))?;
    let summary = serde_json::to_string(&customer.summary)
        .map_err(|error| StoreError::Decode(error.to_string()))?;
    Ok((history, summary))
}

fn customer_from_row(row: SqliteRow) -> Result<Customer, StoreError> {
    let status_raw: String = row.try_get("status")?;
    let history_raw: String = row.try_get("history")?;
    let summary_raw: String = row.try_get("summary")?;
    let total: i64 = row.try_get("total_interactions")?;

    let history: Vec<InteractionEntry> = serde_json::from_str(&history_raw)
        .map_err(|error| StoreError::Decode(error.to_string()))?;
    let summary: SummaryStats = serde_json::from_str(&summary_raw)
        .map_err(|error| StoreError::Decode(error.to_string()))?;

    Ok(Customer {
        id: CustomerId(row.try_get("id")?),
        name: row.try_get("name")?,
        phone: PhoneNumber(row.try_get("phone")?),
        status: LeadStatus::parse(&status_raw)
            .ok_or_else(|| StoreError::Decode(format!("unknown lead status `{status_raw}`")))?,
        last_activity: datetime_from_raw(row.try_get("last_activity")?)?,
        total_interactions: u32::try_from(total)
            .map_err(|_| StoreError::Decode(format!("bad interaction count `{total}`")))?,
        history,
        summary,
        created_at: datetime_from_raw(row.try_get("created_at")?)?,
    })
}
