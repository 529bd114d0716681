//! Signed-in user capability handed to every controller.

use std::fmt;

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct CurrentUser {
    pub id: Uuid,
    pub display_name: String,
    pub email: Option<String>,
    pub is_guest: bool,
}

impl CurrentUser {
    pub fn new(display_name: impl Into<String>, email: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            display_name: display_name.into(),
            email,
            is_guest: false,
        }
    }

    /// "Entrar como Convidado"
    pub fn guest() -> Self {
        Self {
            id: Uuid::new_v4(),
            display_name: "Convidado".to_string(),
            email: None,
            is_guest: true,
        }
    }
}

impl fmt::Display for CurrentUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.email {
            Some(email) => write!(f, "{} <{}>", self.display_name, email),
            None => f.write_str(&self.display_name),
        }
    }
}
