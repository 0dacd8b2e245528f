pub mod common;
pub mod competition;
pub mod organizer;
pub mod registration;
pub mod result;
pub mod team;
pub mod user;
