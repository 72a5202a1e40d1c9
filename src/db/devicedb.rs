// db/devicedb.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::devicemodel::Device;

#[derive(sqlx::FromRow)]
struct RegisteredDevice {
    #[sqlx(flatten)]
    device: Device,
    inserted: bool,
}

#[async_trait]
pub trait DeviceExt {
    async fn get_devices(&self, user_id: Uuid) -> Result<Vec<Device>, sqlx::Error>;

    /// Registers a device, or refreshes it if this user already has it.
    /// The flag is `true` when a new row was created.
    async fn register_device(
        &self,
        user_id: Uuid,
        device_id: &str,
        device_type: Option<String>,
        device_name: Option<String>,
    ) -> Result<(Device, bool), sqlx::Error>;

    /// Returns `false` when no device with that id belongs to the user.
    async fn delete_device(&self, user_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error>;

    async fn touch_device(&self, user_id: Uuid, id: Uuid) -> Result<Option<Device>, sqlx::Error>;
}

#[async_trait]
impl DeviceExt for DBClient {
    async fn get_devices(&self, user_id: Uuid) -> Result<Vec<Device>, sqlx::Error> {
        sqlx::query_as::<_, Device>(
            r#"
            SELECT id, user_id, device_id, device_type, device_name, registered_at, last_active
            FROM devices
            WHERE user_id = $1
            ORDER BY registered_at DESC
            "#
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn register_device(
        &self,
        user_id: Uuid,
        device_id: &str,
        device_type: Option<String>,
        device_name: Option<String>,
    ) -> Result<(Device, bool), sqlx::Error> {
        // xmax is zero only for a freshly inserted row
        let row = sqlx::query_as::<_, RegisteredDevice>(
            r#"
            INSERT INTO devices (user_id, device_id, device_type, device_name, last_active)
            VALUES ($1, $2, $3, $4, NOW())
            ON CONFLICT (user_id, device_id) DO UPDATE
            SET device_type = EXCLUDED.device_type,
                device_name = EXCLUDED.device_name,
                last_active = NOW()
            RETURNING id, user_id, device_id, device_type, device_name, registered_at, last_active,
                      (xmax = 0) AS inserted
            "#
        )
        .bind(user_id)
        .bind(device_id)
        .bind(device_type)
        .bind(device_name)
        .fetch_one(&self.pool)
        .await?;

        Ok((row.device, row.inserted))
    }

    async fn delete_device(&self, user_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM devices WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn touch_device(&self, user_id: Uuid, id: Uuid) -> Result<Option<Device>, sqlx::Error> {
        sqlx::query_as::<_, Device>(
            r#"
            UPDATE devices
            SET last_active = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, device_id, device_type, device_name, registered_at, last_active
            "#
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }
}
