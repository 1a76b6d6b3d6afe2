mod fragment_buffer;
mod fragment_sink;
mod fragment_uploader;
mod recorder;
mod track_recording;

pub use fragment_buffer::*;
pub use fragment_sink::*;
pub use fragment_uploader::*;
pub use recorder::*;
pub use track_recording::*;
