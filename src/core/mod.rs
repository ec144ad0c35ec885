pub mod config;
pub mod context;
pub mod draw;
pub mod generator;
pub mod grammar;
pub mod parser;
pub mod pipeline;
pub mod seed;
