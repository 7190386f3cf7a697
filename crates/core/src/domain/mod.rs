pub mod agent;
pub mod query;
pub mod route;
