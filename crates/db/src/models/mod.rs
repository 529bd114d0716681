pub mod record;
pub mod table;
