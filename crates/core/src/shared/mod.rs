pub mod cancel_token;
pub mod constants;
pub mod source_image;
pub mod submission_stamp;
