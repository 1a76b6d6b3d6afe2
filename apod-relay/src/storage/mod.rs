mod fragment_store;
mod lan;
mod save_dir_picker;

pub use fragment_store::*;
pub use lan::*;
pub use save_dir_picker::*;
