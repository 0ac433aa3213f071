pub mod audit;
pub mod config;
pub mod db;
pub mod dto;
pub mod enhance;
pub mod error;
pub mod models;
pub mod routes;
