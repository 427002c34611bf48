mod media;
mod upload;

pub(crate) use media::{serve_image, serve_video};
pub(crate) use upload::{finalize, upload_chunk};
