// Career-advice chat backed by OpenAI, with one stored conversation per user.

pub mod handlers;
pub mod history;
pub mod prompts;
