mod chat;
mod guru;
mod user;

pub use chat::*;
pub use guru::*;
pub use user::*;
