//! Fixed copy shown by chat front ends

pub const HEADER_TITLE: &str = "Ask me about Cory's skills and experience";

pub const HEADER_SUBTITLE: &str =
    "I'm an AI assistant that can help you learn about Cory's technical abilities and work history.";

pub const WELCOME_MESSAGE: &str =
    "Welcome! Ask me anything about Cory's technical skills, work experience, or projects.";

pub const INPUT_PLACEHOLDER: &str = "Ask me about Cory...";

/// Replaces the in-progress reply whenever a request fails
pub const ERROR_MESSAGE: &str = "Sorry, I encountered an error. Please try again.";

/// Offered while the conversation is empty
pub const EXAMPLE_QUESTIONS: [&str; 3] = [
    "What are Cory's technical skills?",
    "Tell me about Cory's experience at J&J",
    "What are Cory's leadership values and approach?",
];
