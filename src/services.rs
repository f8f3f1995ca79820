pub mod auth;
pub mod availability_service;
pub mod booking_service;
pub mod slot_generator;
