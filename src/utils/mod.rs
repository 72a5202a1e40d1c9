pub mod csv_import;
pub mod password;
pub mod token;
pub mod uploads;
