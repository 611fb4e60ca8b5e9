pub mod data_service;
pub mod date_utils;
pub mod error_messages;
pub mod logging;
pub mod memory;
pub mod validation;
