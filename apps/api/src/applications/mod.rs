// Job applications: CV upload, AI screening against the job description, and
// the applicant's own application list.

pub mod handlers;
pub mod prompts;
pub mod queries;
pub mod screening;
pub mod storage;
