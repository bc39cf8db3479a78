pub mod config;
pub mod doctor;
pub mod models;
pub mod onboard;
pub mod run;
