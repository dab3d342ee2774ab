pub mod create;
pub mod list;

pub use create::post as message_post;
pub use list::get as messages_get;
