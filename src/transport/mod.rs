pub mod sender;

pub use sender::{send_packet, write_all_counted, SendOptions, SendReport};
