pub mod images;

pub use images::get as user_images_get;
