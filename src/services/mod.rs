pub mod auth;
pub mod content;
pub mod mediahost;
pub mod users;
