use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct RegisterDeviceDto {
    #[validate(length(min = 1, max = 255, message = "Device ID is required"))]
    pub device_id: String,
    #[validate(length(max = 64, message = "Device type is too long"))]
    pub device_type: Option<String>,
    #[validate(length(max = 255, message = "Device name is too long"))]
    pub device_name: Option<String>,
}
