use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::pointsmodel::{PointsTransactionListing, PointsTransactionType};

#[derive(Debug, Serialize)]
pub struct PointsBalanceDto {
    pub current_balance: i64,
    pub min_reimbursement_points: i64,
    pub transactions: Vec<PointsTransactionListing>,
}

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct AdjustPointsDto {
    pub user_id: Uuid,
    pub points: i64,
    #[validate(length(max = 500, message = "Description is too long"))]
    pub description: Option<String>,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct PointsHistoryQueryDto {
    pub user_id: Option<Uuid>,
    pub transaction_type: Option<PointsTransactionType>,
    #[validate(range(min = 1, max = 500))]
    pub limit: Option<i64>,
}
