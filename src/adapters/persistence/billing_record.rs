use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::subscription_lifecycle::{
        BillingRecordRepo, NewBillingRecord, SubscriptionUpdate,
    },
    domain::entities::billing_record::{BillingRecord, BillingStatus},
};

fn row_to_record(row: &sqlx::postgres::PgRow) -> BillingRecord {
    BillingRecord {
        id: row.get("id"),
        shop: row.get("shop"),
        charge_id: row.get("charge_id"),
        subscription_id: row.get("subscription_id"),
        plan_name: row.get("plan_name"),
        price: row.get("price"),
        billing_on: row.get("billing_on"),
        trial_ends_on: row.get("trial_ends_on"),
        plan_expires_on: row.get("plan_expires_on"),
        status: row.get("status"),
        created_at: row.get("created_at"),
    }
}

const SELECT_COLS: &str = r#"
    id, shop, charge_id, subscription_id, plan_name, price,
    billing_on, trial_ends_on, plan_expires_on, status, created_at
"#;

#[async_trait]
impl BillingRecordRepo for PostgresPersistence {
    async fn current_for_shop(&self, shop: &str) -> AppResult<Option<BillingRecord>> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {}
            FROM billing_records r
            JOIN billing_current c ON c.record_id = r.id
            WHERE c.shop = $1
            "#,
            SELECT_COLS
        ))
        .bind(shop)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_record))
    }

    async fn insert_as_current(&self, input: &NewBillingRecord) -> AppResult<BillingRecord> {
        let mut tx = self.pool.begin().await.map_err(AppError::from)?;

        // Prior non-terminal records for the shop are superseded
        sqlx::query(
            r#"
            UPDATE billing_records
            SET status = 'replaced'
            WHERE shop = $1 AND status IN ('pending', 'active', 'scheduled_cancelled')
            "#,
        )
        .bind(&input.shop)
        .execute(&mut *tx)
        .await
        .map_err(AppError::from)?;

        let id = Uuid::new_v4();
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO billing_records
                (id, shop, charge_id, subscription_id, plan_name, price,
                 billing_on, trial_ends_on, plan_expires_on, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            SELECT_COLS
        ))
        .bind(id)
        .bind(&input.shop)
        .bind(&input.charge_id)
        .bind(&input.subscription_id)
        .bind(&input.plan_name)
        .bind(input.price)
        .bind(input.billing_on)
        .bind(input.trial_ends_on)
        .bind(input.plan_expires_on)
        .bind(input.status)
        .fetch_one(&mut *tx)
        .await
        .map_err(AppError::from)?;

        sqlx::query(
            r#"
            INSERT INTO billing_current (shop, record_id)
            VALUES ($1, $2)
            ON CONFLICT (shop) DO UPDATE SET record_id = EXCLUDED.record_id
            "#,
        )
        .bind(&input.shop)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(AppError::from)?;

        tx.commit().await.map_err(AppError::from)?;
        Ok(row_to_record(&row))
    }

    async fn set_status(&self, id: Uuid, status: BillingStatus) -> AppResult<()> {
        sqlx::query("UPDATE billing_records SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(())
    }

    async fn apply_update(&self, id: Uuid, update: &SubscriptionUpdate) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE billing_records SET
                status = $2,
                subscription_id = COALESCE($3, subscription_id),
                plan_expires_on = COALESCE($4, plan_expires_on)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(update.status)
        .bind(&update.subscription_id)
        .bind(update.plan_expires_on)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(())
    }

    async fn cancel_by_charge_id(&self, shop: &str, charge_id: &str) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE billing_records
            SET status = 'cancelled'
            WHERE shop = $1 AND charge_id = $2
              AND status IN ('pending', 'active', 'scheduled_cancelled')
            "#,
        )
        .bind(shop)
        .bind(charge_id)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(result.rows_affected())
    }

    async fn history_for_shop(&self, shop: &str) -> AppResult<Vec<BillingRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM billing_records WHERE shop = $1 ORDER BY created_at DESC",
            SELECT_COLS
        ))
        .bind(shop)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(rows.iter().map(row_to_record).collect())
    }
}
