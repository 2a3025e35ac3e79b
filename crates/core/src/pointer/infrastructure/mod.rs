pub mod strm_file_resolver;
