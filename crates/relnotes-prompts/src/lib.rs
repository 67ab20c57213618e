pub mod changelog;
pub mod email;
pub mod summary;

pub use changelog::{assemble_prompt, MAX_PROMPT_PRS};
pub use email::assemble_email_prompt;
pub use summary::PrSummary;
