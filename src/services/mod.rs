pub mod admin;
pub mod app_data;
pub mod payment;
pub mod reports;
pub mod session;
