pub mod core;
pub mod db;
pub mod jobs;
pub mod library_web_server;
pub mod models;
pub mod routes;
pub mod services;
