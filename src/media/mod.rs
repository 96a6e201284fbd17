/// Image pipeline module
///
/// This module handles uploaded images before they enter a project:
/// - Downscaling panoramas and logos to their size limits
/// - Re-encoding them as JPEG data URIs stored inline in the project

pub mod compress;

pub use compress::{compress, compress_blocking, compress_file, decode_data_uri};
