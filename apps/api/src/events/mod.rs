// Personal calendar events (interviews, deadlines) owned by a single user.

pub mod handlers;
pub mod queries;
