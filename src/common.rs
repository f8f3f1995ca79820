pub mod calendar;
pub mod db_utils;
pub mod error;
pub mod interval;
