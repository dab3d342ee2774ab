pub mod annotation;
pub mod chat_message;
pub mod image;
pub mod image_share;

pub use annotation::{Annotation, NewAnnotation};
pub use chat_message::ChatMessage;
pub use image::{Image, NewImage, UserImageRow};
pub use image_share::ImageShare;
