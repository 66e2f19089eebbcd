use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::errors::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum UserStatus {
    Active,
    Inactive,
    Suspended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum UserRole {
    Customer,
    Manager,
    Admin,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "Active",
            UserStatus::Inactive => "Inactive",
            UserStatus::Suspended => "Suspended",
        }
    }
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Customer => "Customer",
            UserRole::Manager => "Manager",
            UserRole::Admin => "Admin",
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Active" => Ok(UserStatus::Active),
            "Inactive" => Ok(UserStatus::Inactive),
            "Suspended" => Ok(UserStatus::Suspended),
            other => Err(DomainError::Internal(format!("unknown user status '{}'", other))),
        }
    }
}

impl FromStr for UserRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Customer" => Ok(UserRole::Customer),
            "Manager" => Ok(UserRole::Manager),
            "Admin" => Ok(UserRole::Admin),
            other => Err(DomainError::Internal(format!("unknown user role '{}'", other))),
        }
    }
}

/// Decimal degrees.
#[derive(Debug, Clone, PartialEq)]
pub struct Geolocation {
    pub lat: BigDecimal,
    pub long: BigDecimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Address {
    pub city: String,
    pub street: String,
    pub number: i32,
    /// Eight digits, no separator.
    pub zipcode: String,
    pub geolocation: Geolocation,
}

/// User fields supplied on registration and on update.
#[derive(Debug, Clone)]
pub struct UserInput {
    pub username: String,
    pub email: String,
    pub phone: String,
    pub first_name: String,
    pub last_name: String,
    pub status: UserStatus,
    pub role: UserRole,
    pub address: Option<Address>,
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub phone: String,
    pub first_name: String,
    pub last_name: String,
    pub status: UserStatus,
    pub role: UserRole,
    pub address: Option<Address>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Name shown on sales: "first last", or just the first name when the
    /// last name is blank.
    pub fn display_name(&self) -> String {
        if self.last_name.trim().is_empty() {
            self.first_name.clone()
        } else {
            format!("{} {}", self.first_name, self.last_name)
        }
    }
}
