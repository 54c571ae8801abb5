pub const CAREER_ADVISOR_SYSTEM: &str = "You are a helpful career advisor assistant. \
    Help users with job applications, CV tips, and interview preparation.";

pub const CHAT_TEMPERATURE: f32 = 0.8;
