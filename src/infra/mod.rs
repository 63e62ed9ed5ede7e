pub mod clock;
pub mod http_client;
pub mod integration_sink;

pub use clock::{FixedClock, SystemClock};
pub use http_client::ReqwestHttp;
pub use integration_sink::{JsonLinesSink, LogSink, MemorySink};
