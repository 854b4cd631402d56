//! The call surface a shell invokes. None of these return errors: failures
//! become sentinel strings, empty lists, or are logged.

pub mod chat;
pub mod settings;
