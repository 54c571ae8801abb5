// Curated YouTube job-hunting videos with a Redis-backed cache.

pub mod cache;
pub mod handlers;
pub mod youtube;
