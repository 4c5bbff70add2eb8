pub mod slug;
pub mod user;
