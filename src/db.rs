pub mod availability_repo;
pub use availability_repo::AvailabilityRepository;
pub mod booking_repo;
pub use booking_repo::BookingRepository;
pub mod catalog_repo;
pub use catalog_repo::CatalogRepository;
