use chrono::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Worker,
}

impl UserRole {
    pub fn to_str(&self) -> &str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Worker => "worker",
        }
    }
}

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub role: UserRole,
    pub name: String,
    pub phone: Option<String>,
    pub sex: Option<String>,
    pub address: Option<String>,
    pub age: Option<i32>,
    // Payout handle used for reimbursements
    pub paytm: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Resolved identity of whoever is calling a service operation.
///
/// Built once by the auth middleware and handed explicitly to every
/// operation instead of being read from ambient request state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: Uuid,
    pub role: UserRole,
}

impl Caller {
    pub fn new(user_id: Uuid, role: UserRole) -> Self {
        Self { user_id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    pub fn is_worker(&self) -> bool {
        self.role == UserRole::Worker
    }
}

impl From<&User> for Caller {
    fn from(user: &User) -> Self {
        Caller::new(user.id, user.role)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, sqlx::FromRow)]
pub struct RatingSummary {
    pub average_rating: Option<f64>,
    pub total_ratings: i64,
}

impl RatingSummary {
    pub fn from_ratings(ratings: &[i16]) -> Self {
        if ratings.is_empty() {
            return RatingSummary { average_rating: None, total_ratings: 0 };
        }
        let sum: i64 = ratings.iter().map(|r| *r as i64).sum();
        RatingSummary {
            average_rating: Some(sum as f64 / ratings.len() as f64),
            total_ratings: ratings.len() as i64,
        }
    }
}
