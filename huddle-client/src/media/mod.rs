mod local_capture;
mod media_source;
mod sink;
mod stream;

pub use local_capture::*;
pub use media_source::*;
pub use sink::*;
pub use stream::*;
