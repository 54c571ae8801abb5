pub mod application;
pub mod chat;
pub mod event;
pub mod job;
pub mod user;
