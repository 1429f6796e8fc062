pub mod child;
pub mod health_center;
pub mod vaccination;
pub mod vaccine;
