// Job postings: public listing and detail, employer-owned create / update / soft delete.

pub mod handlers;
pub mod queries;
