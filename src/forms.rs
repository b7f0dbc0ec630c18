//! Form decoding and validation. HTML forms arrive as repeated
//! key/value pairs (multi-selects submit one pair per choice), so the
//! raw body is kept in a `FormData` multimap. Each entity has a form
//! struct holding the submitted strings for re-rendering, plus a
//! `validate` step producing the typed service input or per-field
//! errors.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::service::account_type::AccountTypeInput;
use crate::service::department::DepartmentInput;
use crate::service::employee::{EmployeeInput, EmployeeRecord};
use crate::service::manager::{ManagerInput, ManagerRecord};
use crate::service::profile::{ProfileInput, ProfileRecord};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

pub const REQUIRED: &str = "This field is required.";
pub const BAD_EMAIL: &str = "Enter a valid email address.";
pub const BAD_DATE: &str = "Enter a valid date (YYYY-MM-DD).";
pub const BAD_ID: &str = "Invalid selection.";

pub struct FormData {
    fields: HashMap<String, Vec<String>>,
}

impl FormData {
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut fields: HashMap<String, Vec<String>> = HashMap::new();
        for (key, value) in pairs {
            fields.entry(key).or_default().push(value);
        }
        Self { fields }
    }

    /// First submitted value for a field, trimmed; empty when absent.
    pub fn value(&self, name: &str) -> String {
        self.fields
            .get(name)
            .and_then(|v| v.first())
            .map(|v| v.trim().to_string())
            .unwrap_or_default()
    }

    pub fn values(&self, name: &str) -> Vec<String> {
        self.fields.get(name).cloned().unwrap_or_default()
    }
}

#[derive(Debug, Default)]
pub struct FieldErrors {
    errors: BTreeMap<&'static str, String>,
}

impl FieldErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.entry(field).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

fn parse_id(value: &str) -> Option<i32> {
    value.trim().parse::<i32>().ok()
}

fn require(errors: &mut FieldErrors, field: &'static str, value: &str) {
    if value.trim().is_empty() {
        errors.add(field, REQUIRED);
    }
}

fn check_email(errors: &mut FieldErrors, field: &'static str, value: &str) {
    if value.trim().is_empty() {
        errors.add(field, REQUIRED);
    } else if !EMAIL_RE.is_match(value.trim()) {
        errors.add(field, BAD_EMAIL);
    }
}

// ---------------------------------------------------------------- forms

#[derive(Clone, Debug, Default)]
pub struct DepartmentForm {
    pub name: String,
}

impl DepartmentForm {
    pub fn from_data(data: &FormData) -> Self {
        Self {
            name: data.value("name"),
        }
    }

    pub fn from_name(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }

    pub fn validate(&self) -> Result<DepartmentInput, FieldErrors> {
        let mut errors = FieldErrors::default();
        require(&mut errors, "name", &self.name);
        if errors.is_empty() {
            Ok(DepartmentInput {
                name: self.name.trim().to_string(),
            })
        } else {
            Err(errors)
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct AccountTypeForm {
    pub name: String,
    pub description: String,
}

impl AccountTypeForm {
    pub fn from_data(data: &FormData) -> Self {
        Self {
            name: data.value("name"),
            description: data.value("description"),
        }
    }

    pub fn from_model(model: &crate::entity::account_type::Model) -> Self {
        Self {
            name: model.name.clone(),
            description: model.description.clone().unwrap_or_default(),
        }
    }

    pub fn validate(&self) -> Result<AccountTypeInput, FieldErrors> {
        let mut errors = FieldErrors::default();
        require(&mut errors, "name", &self.name);
        if !errors.is_empty() {
            return Err(errors);
        }
        let description = self.description.trim();
        Ok(AccountTypeInput {
            name: self.name.trim().to_string(),
            description: if description.is_empty() {
                None
            } else {
                Some(description.to_string())
            },
        })
    }
}

#[derive(Clone, Debug, Default)]
pub struct ProfileForm {
    pub name: String,
    pub account_type_ids: Vec<String>,
}

impl ProfileForm {
    pub fn from_data(data: &FormData) -> Self {
        Self {
            name: data.value("name"),
            account_type_ids: data.values("account_types"),
        }
    }

    pub fn from_record(record: &ProfileRecord) -> Self {
        Self {
            name: record.name.clone(),
            account_type_ids: record.account_type_ids.iter().map(|id| id.to_string()).collect(),
        }
    }

    pub fn validate(&self) -> Result<ProfileInput, FieldErrors> {
        let mut errors = FieldErrors::default();
        require(&mut errors, "name", &self.name);

        let mut ids = Vec::with_capacity(self.account_type_ids.len());
        for raw in &self.account_type_ids {
            match parse_id(raw) {
                Some(id) => ids.push(id),
                None => {
                    errors.add("account_types", BAD_ID);
                    break;
                }
            }
        }
        // A profile is a bundle; it must reference at least one type.
        if ids.is_empty() && errors.get("account_types").is_none() {
            errors.add("account_types", "Select at least one account type.");
        }

        if errors.is_empty() {
            Ok(ProfileInput {
                name: self.name.trim().to_string(),
                account_type_ids: ids,
            })
        } else {
            Err(errors)
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ManagerForm {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

impl ManagerForm {
    pub fn from_data(data: &FormData) -> Self {
        Self {
            username: data.value("username"),
            first_name: data.value("first_name"),
            last_name: data.value("last_name"),
            email: data.value("email"),
            password: data.value("password"),
        }
    }

    pub fn from_record(record: &ManagerRecord) -> Self {
        Self {
            username: record.username.clone(),
            first_name: record.first_name.clone(),
            last_name: record.last_name.clone(),
            email: record.email.clone(),
            password: String::new(),
        }
    }

    /// `require_password` is true on create; on edit a blank password
    /// means "keep the current one".
    pub fn validate(&self, require_password: bool) -> Result<ManagerInput, FieldErrors> {
        let mut errors = FieldErrors::default();
        require(&mut errors, "username", &self.username);
        require(&mut errors, "first_name", &self.first_name);
        require(&mut errors, "last_name", &self.last_name);
        check_email(&mut errors, "email", &self.email);
        if require_password && self.password.trim().is_empty() {
            errors.add("password", REQUIRED);
        }
        if !errors.is_empty() {
            return Err(errors);
        }
        let password = self.password.trim();
        Ok(ManagerInput {
            username: self.username.trim().to_string(),
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_string(),
            password: if password.is_empty() {
                None
            } else {
                Some(password.to_string())
            },
        })
    }
}

#[derive(Clone, Debug, Default)]
pub struct EmployeeForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub department_id: String,
    pub account_type_ids: Vec<String>,
    pub hire_date: String,
}

impl EmployeeForm {
    pub fn from_data(data: &FormData) -> Self {
        Self {
            first_name: data.value("first_name"),
            last_name: data.value("last_name"),
            email: data.value("email"),
            department_id: data.value("department"),
            account_type_ids: data.values("account_types"),
            hire_date: data.value("hire_date"),
        }
    }

    pub fn from_record(record: &EmployeeRecord) -> Self {
        Self {
            first_name: record.first_name.clone(),
            last_name: record.last_name.clone(),
            email: record.email.clone(),
            department_id: record
                .department_id
                .map(|id| id.to_string())
                .unwrap_or_default(),
            account_type_ids: record.account_type_ids.iter().map(|id| id.to_string()).collect(),
            hire_date: record
                .hire_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
        }
    }

    pub fn validate(&self) -> Result<EmployeeInput, FieldErrors> {
        let mut errors = FieldErrors::default();
        require(&mut errors, "first_name", &self.first_name);
        require(&mut errors, "last_name", &self.last_name);
        check_email(&mut errors, "email", &self.email);

        let department_id = if self.department_id.trim().is_empty() {
            None
        } else {
            match parse_id(&self.department_id) {
                Some(id) => Some(id),
                None => {
                    errors.add("department", BAD_ID);
                    None
                }
            }
        };

        let mut account_type_ids = Vec::with_capacity(self.account_type_ids.len());
        for raw in &self.account_type_ids {
            match parse_id(raw) {
                Some(id) => account_type_ids.push(id),
                None => {
                    errors.add("account_types", BAD_ID);
                    break;
                }
            }
        }

        let hire_date = if self.hire_date.trim().is_empty() {
            None
        } else {
            match NaiveDate::parse_from_str(self.hire_date.trim(), "%Y-%m-%d") {
                Ok(date) => Some(date),
                Err(_) => {
                    errors.add("hire_date", BAD_DATE);
                    None
                }
            }
        };

        if errors.is_empty() {
            Ok(EmployeeInput {
                first_name: self.first_name.trim().to_string(),
                last_name: self.last_name.trim().to_string(),
                email: self.email.trim().to_string(),
                department_id,
                account_type_ids,
                hire_date,
            })
        } else {
            Err(errors)
        }
    }
}
