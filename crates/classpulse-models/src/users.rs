//! Accounts: students, teachers and admins.
//!
//! A user's role decides which extra fields it carries. Storage keeps them as
//! nullable columns ([`UserRow`]); the domain type ([`User`]) carries them as a
//! tagged union ([`RoleProfile`]) so a student without a student id cannot exist
//! past the conversion.

use chrono::{DateTime, Utc};
use classpulse_core::AppError;
use classpulse_core::pagination::{PaginationParams, deserialize_optional_i64};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::ids::UserId;
use crate::value_types::Email;

pub const MIN_ACADEMIC_YEAR: i32 = 1;
pub const MAX_ACADEMIC_YEAR: i32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Teacher => "teacher",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Self::Student),
            "teacher" => Ok(Self::Teacher),
            "admin" => Ok(Self::Admin),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "department")]
pub enum Department {
    Mathematics,
    Physics,
    Chemistry,
    Biology,
    #[serde(rename = "Computer Science")]
    #[sqlx(rename = "Computer Science")]
    ComputerScience,
    English,
    History,
    Geography,
    Economics,
}

impl Department {
    pub const ALL: [Department; 9] = [
        Self::Mathematics,
        Self::Physics,
        Self::Chemistry,
        Self::Biology,
        Self::ComputerScience,
        Self::English,
        Self::History,
        Self::Geography,
        Self::Economics,
    ];
}

/// Role-specific attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleProfile {
    Student {
        student_id: String,
        academic_year: i32,
    },
    Teacher {
        department: Department,
    },
    Admin,
}

impl RoleProfile {
    pub fn role(&self) -> Role {
        match self {
            Self::Student { .. } => Role::Student,
            Self::Teacher { .. } => Role::Teacher,
            Self::Admin => Role::Admin,
        }
    }

    /// Column values `(student_id, academic_year, department)` for persistence.
    pub fn columns(&self) -> (Option<&str>, Option<i32>, Option<Department>) {
        match self {
            Self::Student {
                student_id,
                academic_year,
            } => (Some(student_id.as_str()), Some(*academic_year), None),
            Self::Teacher { department } => (None, None, Some(*department)),
            Self::Admin => (None, None, None),
        }
    }
}

/// The acting identity of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: UserId,
    pub role: Role,
}

/// Columns selected for every [`UserRow`] query.
pub const USER_COLUMNS: &str = "id, username, email, password, role, first_name, last_name, \
     student_id, academic_year, department, profile_picture, is_active, last_login, \
     created_at, updated_at";

#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
    pub student_id: Option<String>,
    pub academic_year: Option<i32>,
    pub department: Option<Department>,
    pub profile_picture: String,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub profile: RoleProfile,
    pub profile_picture: String,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn role(&self) -> Role {
        self.profile.role()
    }

    pub fn actor(&self) -> Actor {
        Actor {
            id: self.id,
            role: self.role(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let profile = match row.role {
            Role::Student => match (row.student_id, row.academic_year) {
                (Some(student_id), Some(academic_year)) => RoleProfile::Student {
                    student_id,
                    academic_year,
                },
                _ => {
                    return Err(AppError::internal_error(format!(
                        "student {} is missing student id or academic year",
                        row.id
                    )));
                }
            },
            Role::Teacher => match row.department {
                Some(department) => RoleProfile::Teacher { department },
                None => {
                    return Err(AppError::internal_error(format!(
                        "teacher {} is missing a department",
                        row.id
                    )));
                }
            },
            Role::Admin => RoleProfile::Admin,
        };

        Ok(Self {
            id: row.id,
            username: row.username,
            email: row.email,
            password_hash: row.password,
            first_name: row.first_name,
            last_name: row.last_name,
            profile,
            profile_picture: row.profile_picture,
            is_active: row.is_active,
            last_login: row.last_login,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Public representation of a user. Never contains the password hash.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub academic_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<Department>,
    pub profile_picture: String,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        let (student_id, academic_year, department) = user.profile.columns();
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            full_name: user.full_name(),
            student_id: student_id.map(str::to_string),
            academic_year,
            department,
            profile_picture: user.profile_picture.clone(),
            is_active: user.is_active,
            last_login: user.last_login,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Minimal reference embedded in feedback representations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: UserId,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeacherListItem {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub department: Option<Department>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 50, message = "Username is required"))]
    pub username: String,
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    /// `student` or `teacher`
    pub role: String,
    #[validate(length(min = 1, max = 50, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 50, message = "Last name is required"))]
    pub last_name: String,
    pub student_id: Option<String>,
    pub academic_year: Option<i32>,
    pub department: Option<Department>,
}

/// A validated registration ready to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: Email,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub profile: RoleProfile,
}

impl NewUser {
    /// Applies the role-conditional rules: students need a student id and an
    /// academic year in 1..=4, teachers need a department, admins cannot self-register.
    pub fn from_registration(req: RegisterRequest) -> Result<Self, AppError> {
        let email = Email::new(&req.email).map_err(|e| AppError::validation(e.to_string()))?;

        let profile = match req.role.trim() {
            "student" => {
                let student_id = req
                    .student_id
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .ok_or_else(|| AppError::validation("Student ID is required for students"))?;
                let academic_year = req.academic_year.ok_or_else(|| {
                    AppError::validation("Academic year is required for students")
                })?;
                validate_academic_year(academic_year)?;
                RoleProfile::Student {
                    student_id,
                    academic_year,
                }
            }
            "teacher" => {
                let department = req
                    .department
                    .ok_or_else(|| AppError::validation("Department is required for teachers"))?;
                RoleProfile::Teacher { department }
            }
            _ => {
                return Err(AppError::validation(
                    "Role must be either student or teacher",
                ));
            }
        };

        Ok(Self {
            username: normalize_username(&req.username, "Username is required")?,
            email,
            password: req.password,
            first_name: required_text(&req.first_name, "First name is required")?,
            last_name: required_text(&req.last_name, "Last name is required")?,
            profile,
        })
    }
}

/// Trims `raw` and rejects values that are blank afterwards.
fn required_text(raw: &str, message: &str) -> Result<String, AppError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(AppError::validation(message));
    }
    Ok(value.to_string())
}

/// Usernames share the login field with emails, so they may not contain `@`.
pub fn normalize_username(raw: &str, message: &str) -> Result<String, AppError> {
    let username = required_text(raw, message)?;
    if username.contains('@') {
        return Err(AppError::validation("Username cannot contain @"));
    }
    Ok(username)
}

pub fn validate_academic_year(year: i32) -> Result<(), AppError> {
    if !(MIN_ACADEMIC_YEAR..=MAX_ACADEMIC_YEAR).contains(&year) {
        return Err(AppError::validation(
            "Academic year must be between 1 and 4",
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 50, message = "Username cannot be empty"))]
    pub username: Option<String>,
    pub email: Option<String>,
    #[validate(length(min = 1, max = 50, message = "First name cannot be empty"))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 50, message = "Last name cannot be empty"))]
    pub last_name: Option<String>,
    /// Students only
    pub academic_year: Option<i32>,
    /// Teachers only
    pub department: Option<Department>,
}

/// Profile fields a given role is allowed to change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileChanges {
    pub username: Option<String>,
    pub email: Option<Email>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub academic_year: Option<i32>,
    pub department: Option<Department>,
}

impl ProfileChanges {
    /// Drops fields that do not belong to `role`.
    pub fn for_role(role: Role, req: UpdateProfileRequest) -> Result<Self, AppError> {
        let email = req
            .email
            .map(Email::new)
            .transpose()
            .map_err(|e| AppError::validation(e.to_string()))?;

        let academic_year = match role {
            Role::Student => req.academic_year,
            _ => None,
        };
        if let Some(year) = academic_year {
            validate_academic_year(year)?;
        }

        Ok(Self {
            username: req
                .username
                .map(|s| normalize_username(&s, "Username cannot be empty"))
                .transpose()?,
            email,
            first_name: req
                .first_name
                .map(|s| required_text(&s, "First name cannot be empty"))
                .transpose()?,
            last_name: req
                .last_name
                .map(|s| required_text(&s, "Last name cannot be empty"))
                .transpose()?,
            academic_year,
            department: match role {
                Role::Teacher => req.department,
                _ => None,
            },
        })
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub new_password: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetActiveRequest {
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserListQuery {
    pub role: Option<Role>,
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub page: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub limit: Option<i64>,
}

impl UserListQuery {
    pub fn pagination(&self) -> PaginationParams {
        PaginationParams {
            page: self.page,
            limit: self.limit,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total: i64,
    pub students: i64,
    pub teachers: i64,
    pub admins: i64,
    pub active: i64,
}
