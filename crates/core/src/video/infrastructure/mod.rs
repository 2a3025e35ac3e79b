pub mod ffmpeg_decoder;
pub mod image_file_writer;
