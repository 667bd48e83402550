pub mod schema;
pub mod source_table;
