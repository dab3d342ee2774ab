pub mod create;
pub mod list;

pub use create::post as annotation_post;
pub use list::get as annotations_get;
