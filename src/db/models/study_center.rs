//! Study center models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StudyCenter {
    pub id: i64,
    pub center_code: String,
    pub name: String,
    pub address: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateStudyCenterRequest {
    pub center_code: String,
    pub name: String,
    pub address: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateStudyCenterRequest {
    pub center_code: Option<String>,
    pub name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub is_active: Option<bool>,
}

impl UpdateStudyCenterRequest {
    pub fn is_empty(&self) -> bool {
        self.center_code.is_none()
            && self.name.is_none()
            && self.address.is_none()
            && self.city.is_none()
            && self.state.is_none()
            && self.pincode.is_none()
            && self.phone.is_none()
            && self.email.is_none()
            && self.is_active.is_none()
    }
}
