// Standalone CV review: upload a PDF, get category scores and advice.

pub mod handlers;
pub mod pdf;
pub mod prompts;
