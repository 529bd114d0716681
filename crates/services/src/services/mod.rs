pub mod auth;
pub mod config;
pub mod confirmation;
pub mod console;
pub mod dialog;
pub mod entities;
pub mod list_query;
pub mod notification;
pub mod reports;
pub mod resource;
pub mod validator;

#[cfg(test)]
pub(crate) mod test_support;
