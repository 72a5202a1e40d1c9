use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    db::userdb::ProfileUpdate,
    models::usermodel::{RatingSummary, User, UserRole},
};

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct RegisterUserDto {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,

    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Email is invalid")
    )]
    pub email: String,

    #[validate(
        length(min = 1, message = "Password is required"),
        length(min = 6, message = "Password must be at least 6 characters"),
        length(max = 64, message = "Password must be at most 64 characters")
    )]
    pub password: String,

    #[validate(length(min = 1, message = "Confirm Password is required"))]
    #[serde(rename = "passwordConfirm")]
    pub password_confirm: String,

    #[validate(length(max = 32, message = "Phone number is too long"))]
    pub phone: Option<String>,

    pub role: Option<UserRole>,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct LoginUserDto {
    #[validate(length(min = 1, message = "Email is required"), email(message = "Email is invalid"))]
    pub email: String,
    #[validate(
        length(min = 1, message = "Password is required"),
        length(min = 6, message = "Password must be at least 6 characters")
    )]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FilterUserDto {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub phone: Option<String>,
    pub sex: Option<String>,
    pub address: Option<String>,
    pub age: Option<i32>,
    pub paytm: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl FilterUserDto {
    pub fn filter_user(user: &User) -> Self {
        FilterUserDto {
            id: user.id.to_string(),
            name: user.name.to_owned(),
            email: user.email.to_owned(),
            role: user.role.to_str().to_string(),
            phone: user.phone.clone(),
            sex: user.sex.clone(),
            address: user.address.clone(),
            age: user.age,
            paytm: user.paytm.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserData {
    pub user: FilterUserDto,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserLoginResponseDto {
    pub status: String,
    pub token: String,
    pub user: FilterUserDto,
}

/// Profile view; workers also get their review rating summary.
#[derive(Debug, Serialize)]
pub struct ProfileDto {
    #[serde(flatten)]
    pub user: FilterUserDto,
    #[serde(flatten)]
    pub rating: Option<RatingSummary>,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct ProfileUpdateDto {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 32, message = "Phone number is too long"))]
    pub phone: Option<String>,
    #[validate(length(max = 16, message = "Sex is too long"))]
    pub sex: Option<String>,
    pub address: Option<String>,
    #[validate(range(min = 13, max = 120, message = "Age must be between 13 and 120"))]
    pub age: Option<i32>,
    #[validate(length(min = 1, max = 64, message = "Paytm account must be between 1 and 64 characters"))]
    pub paytm: Option<String>,
}

impl From<ProfileUpdateDto> for ProfileUpdate {
    fn from(dto: ProfileUpdateDto) -> Self {
        ProfileUpdate {
            name: dto.name,
            phone: dto.phone,
            sex: dto.sex,
            address: dto.address,
            age: dto.age,
            paytm: dto.paytm,
        }
    }
}

#[derive(Debug, Validate, Default, Clone, Serialize, Deserialize)]
pub struct UserPasswordUpdateDto {
    #[validate(
        length(min = 1, message = "New password is required."),
        length(min = 6, message = "new password must be at least 6 characters"),
        length(max = 64, message = "new password must be at most 64 characters")
    )]
    pub new_password: String,

    #[validate(length(min = 1, message = "New password confirm is required."))]
    pub new_password_confirm: String,

    #[validate(length(min = 1, message = "Old password is required."))]
    pub old_password: String,
}

#[derive(Debug, Validate, Default, Clone, Serialize, Deserialize)]
pub struct DeleteAccountDto {
    #[validate(length(min = 1, message = "Password is required to delete account"))]
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_requires_valid_email_and_password() {
        let dto = RegisterUserDto {
            name: "Asha".to_string(),
            email: "not-an-email".to_string(),
            password: "123".to_string(),
            password_confirm: "123".to_string(),
            ..Default::default()
        };
        let errors = dto.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
    }

    #[test]
    fn test_register_rejects_passwords_the_hasher_refuses() {
        let long = "x".repeat(65);
        let dto = RegisterUserDto {
            name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            password: long.clone(),
            password_confirm: long,
            ..Default::default()
        };
        assert!(dto.validate().unwrap_err().field_errors().contains_key("password"));
    }

    #[test]
    fn test_profile_update_bounds() {
        let dto = ProfileUpdateDto {
            age: Some(7),
            ..Default::default()
        };
        assert!(dto.validate().is_err());

        let dto = ProfileUpdateDto {
            paytm: Some("9876543210@paytm".to_string()),
            ..Default::default()
        };
        assert!(dto.validate().is_ok());
        assert!(!ProfileUpdate::from(dto).is_empty());
    }
}
