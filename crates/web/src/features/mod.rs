pub mod admin;
pub mod auth;
pub mod competitions;
pub mod invitations;
pub mod organizer;
pub mod registrations;
pub mod teams;
pub mod users;
