pub mod report;
pub mod tokens;
pub mod user;
