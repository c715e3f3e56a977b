pub mod block_parser;
pub mod path_normalizer;

pub use block_parser::{normalize_newlines, render_document, BlockParser, Blocks, FileBlock};
pub use path_normalizer::{escapes_root, is_current_dir, normalize_relative_path};
