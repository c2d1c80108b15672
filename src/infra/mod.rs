pub mod gateway;
pub mod row_json;
