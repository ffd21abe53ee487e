mod api;
pub mod models;

pub use api::{
    GeminiProvider, build_content_body, build_predict_body, build_video_body,
    convert_body_parts_gemini, response_to_content,
};
