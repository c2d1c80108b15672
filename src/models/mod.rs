pub mod prediction;
pub mod stop;
pub mod table;
