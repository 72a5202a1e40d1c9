use serde::{Deserialize, Serialize};

use crate::models::paymentmodel::PaymentStatus;

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct PaymentQueryDto {
    pub status: Option<PaymentStatus>,
}
