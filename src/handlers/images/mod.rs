pub mod share;
pub mod show;
pub mod upload;

pub use share::post as share_post;
pub use show::get as image_get;
pub use upload::direct as image_direct_upload;
pub use upload::signed as image_upload;
