use sqlx::{sqlite::SqliteRow, Row};

use garasi_core::domain::activity::ActivityKind;
use garasi_core::domain::customer::CustomerId;
use garasi_core::domain::legacy::{LegacyEvent, LegacyEventId};
use garasi_core::domain::vehicle::{OfferStatus, VehicleId};

use super::{AnalyticsFilter, LegacyEventStore, StoreError, VehicleKindCount};
use crate::stores::vehicle::datetime_from_raw;
use crate::DbPool;

pub struct SqlLegacyEventStore {
    pool: DbPool,
}

impl SqlLegacyEventStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const SELECT_EVENT: &str =
    "SELECT id, customer_id, vehicle_id, kind, payload, dedup_key, occurred_at FROM legacy_event";

#[async_trait::async_trait]
impl LegacyEventStore for SqlLegacyEventStore {
    async fn insert(&self, event: LegacyEvent) -> Result<(), StoreError> {
        let payload = serde_json::to_string(&event.payload)
            .map_err(|error| StoreError::Decode(error.to_string()))?;
        sqlx::query(
            "INSERT INTO legacy_event (
                id, customer_id, vehicle_id, kind, payload, dedup_key, occurred_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&event.id.0)
        .bind(&event.customer_id.0)
        .bind(&event.vehicle_id.0)
        .bind(event.kind.as_str())
        .bind(payload)
        .bind(event.dedup_key.as_deref())
        .bind(event.occurred_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_by_kind(&self, kind: ActivityKind) -> Result<Vec<LegacyEvent>, StoreError> {
        let rows = sqlx::query(&format!("{SELECT_EVENT} WHERE kind = ? ORDER BY occurred_at DESC"))
            .bind(kind.as_str())
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(event_from_row).collect()
    }

    async fn update_offer_status(
        &self,
        id: &LegacyEventId,
        status: OfferStatus,
        notes: Option<String>,
    ) -> Result<bool, StoreError> {
        // The status lives inside the free-form payload; json_set keeps the
        // rest of it untouched.
        let result = if let Some(notes) = notes {
            sqlx::query(
                "UPDATE legacy_event
                 SET payload = json_set(payload, '$.status', ?, '$.notes', ?)
                 WHERE id = ? AND kind = ?",
            )
            .bind(status.as_str())
            .bind(notes)
            .bind(&id.0)
            .bind(ActivityKind::CashOffer.as_str())
            .execute(&self.pool)
            .await?
        } else {
            sqlx::query(
                "UPDATE legacy_event
                 SET payload = json_set(payload, '$.status', ?)
                 WHERE id = ? AND kind = ?",
            )
            .bind(status.as_str())
            .bind(&id.0)
            .bind(ActivityKind::CashOffer.as_str())
            .execute(&self.pool)
            .await?
        };
        Ok(result.rows_affected() > 0)
    }

    async fn count_by_vehicle_and_kind(
        &self,
        filter: AnalyticsFilter,
    ) -> Result<Vec<VehicleKindCount>, StoreError> {
        let mut sql = String::from(
            "SELECT vehicle_id, kind, COUNT(*) AS event_count FROM legacy_event WHERE 1 = 1",
        );
        if filter.year.is_some() {
            sql.push_str(" AND CAST(strftime('%Y', occurred_at) AS INTEGER) = ?");
        }
        if filter.month.is_some() {
            sql.push_str(" AND CAST(strftime('%m', occurred_at) AS INTEGER) = ?");
        }
        if filter.before.is_some() {
            // The bound cuts off dual-written kinds only; views and purchases
            // have no embedded mirror, so the legacy row is their sole record.
            let exempt: Vec<String> = ActivityKind::ALL
                .iter()
                .filter(|kind| !kind.has_embedded_mirror())
                .map(|kind| format!("'{}'", kind.as_str()))
                .collect();
            sql.push_str(&format!(
                " AND (occurred_at < ? OR kind IN ({}))",
                exempt.join(", ")
            ));
        }
        sql.push_str(" GROUP BY vehicle_id, kind");

        let mut query = sqlx::query(&sql);
        if let Some(year) = filter.year {
            query = query.bind(year);
        }
        if let Some(month) = filter.month {
            query = query.bind(month);
        }
        if let Some(before) = filter.before {
            query = query.bind(before.to_rfc3339());
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.into_iter().map(count_from_row).collect()
    }
}

fn event_from_row(row: SqliteRow) -> Result<LegacyEvent, StoreError> {
    let kind_raw: String = row.try_get("kind")?;
    let payload_raw: String = row.try_get("payload")?;

    Ok(LegacyEvent {
        id: LegacyEventId(row.try_get("id")?),
        customer_id: CustomerId(row.try_get("customer_id")?),
        vehicle_id: VehicleId(row.try_get("vehicle_id")?),
        kind: ActivityKind::parse(&kind_raw)
            .ok_or_else(|| StoreError::Decode(format!("unknown activity kind `{kind_raw}`")))?,
        payload: serde_json::from_str(&payload_raw)
            .map_err(|error| StoreError::Decode(error.to_string()))?,
        dedup_key: row.try_get("dedup_key")?,
        occurred_at: datetime_from_raw(row.try_get("occurred_at")?)?,
    })
}

fn count_from_row(row: SqliteRow) -> Result<VehicleKindCount, StoreError> {
    let kind_raw: String = row.try_get("kind")?;
    let count: i64 = row.try_get("event_count")?;

    Ok(VehicleKindCount {
        vehicle_id: VehicleId(row.try_get("vehicle_id")?),
        kind: ActivityKind::parse(&kind_raw)
            .ok_or_else(|| StoreError::Decode(format!("unknown activity kind `{kind_raw}`")))?,
        count: u64::try_from(count)
            .map_err(|_| StoreError::Decode(format!("bad event count `{count}`")))?,
    })
}
