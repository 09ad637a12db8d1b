pub mod config;
pub mod convert;
pub mod error;
pub mod model;
pub mod parser;
pub mod site;
pub mod slug;
