use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Device {
    pub id: Uuid,
    pub user_id: Uuid,
    pub device_id: String,
    pub device_type: Option<String>,
    pub device_name: Option<String>,
    pub registered_at: DateTime<Utc>,
    pub last_active: Option<DateTime<Utc>>,
}
