pub mod data;
pub mod script;
pub mod seed;
