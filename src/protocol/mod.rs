pub mod packet;

pub use packet::{build_packet, packet_len, split_packet, Framing, SignedReading};
