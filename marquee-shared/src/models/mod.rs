pub mod catalog;
pub mod events;
pub mod payment;
pub mod reservation;
pub mod seat;
pub mod user;
