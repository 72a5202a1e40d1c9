pub mod auth;
pub mod clients;
pub mod devices;
pub mod jobs;
pub mod payments;
pub mod points;
pub mod profile;
pub mod tasks;
