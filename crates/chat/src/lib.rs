//! Chatbot composition: knowledge-grounded generation plus optional voice
//! input and spoken replies.

pub mod bot;

pub use bot::{ChatReply, Chatbot, UserInput};
