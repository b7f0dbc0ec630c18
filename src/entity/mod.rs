pub mod account_type;
pub mod department;
pub mod employee;
pub mod employee_account_type;
pub mod manager;
pub mod profile;
pub mod profile_account_type;
pub mod user;
