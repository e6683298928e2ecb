pub mod cuisine;
pub mod dish;
pub mod ingredient;
pub mod rules;
pub mod technique;
