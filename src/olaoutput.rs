use std::net::{SocketAddr, UdpSocket};

use rosc::{encoder, OscMessage, OscPacket, OscType};

use crate::channels::{Channels, CHANNEL_COUNT};
use crate::error::{Error, Result};
use crate::pwmsink::PwmSink;

const UNIVERSE_SIZE: usize = 512;

/// Sends both outputs as one DMX universe to OLA's OSC plugin.
pub struct OlaOutput {
    sock: UdpSocket,
    target_addr: SocketAddr,
    start_slot: usize,
    buffer: Vec<u8>,
}

impl OlaOutput {
    pub fn new(target_addr: SocketAddr, start_slot: usize) -> Result<Self> {
        let our_addr = SocketAddr::from(([0, 0, 0, 0], 0));
        let sock = UdpSocket::bind(our_addr).map_err(Error::UdpBind)?;

        Ok(OlaOutput {
            sock,
            target_addr,
            start_slot: start_slot.min(UNIVERSE_SIZE - 2 * CHANNEL_COUNT),
            buffer: vec![0; UNIVERSE_SIZE],
        })
    }

    fn set_channels(&mut self, first_slot: usize, channels: &Channels) {
        self.buffer[first_slot..first_slot + CHANNEL_COUNT].copy_from_slice(&channels.to_dmx());
    }

    fn flush(&mut self) -> Result<()> {
        let msg_buf = encode_universe(&self.buffer)?;
        self.sock
            .send_to(&msg_buf, self.target_addr)
            .map_err(Error::UdpSend)?;
        Ok(())
    }
}

fn encode_universe(buffer: &[u8]) -> Result<Vec<u8>> {
    encoder::encode(&OscPacket::Message(OscMessage {
        addr: "/dmx/universe/0".to_string(),
        args: vec![OscType::Blob(buffer.to_vec())],
    }))
    .map_err(Error::OscEncode)
}

impl PwmSink for OlaOutput {
    fn write(&mut self, left: &Channels, right: &Channels) {
        self.set_channels(self.start_slot, left);
        self.set_channels(self.start_slot + CHANNEL_COUNT, right);

        if let Err(err) = self.flush() {
            log::warn!("Failed to send frame to {}: {err}", self.target_addr);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rosc::decoder;
    use std::str::FromStr;

    #[test]
    fn writes_both_sides_into_one_universe() {
        let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
        receiver
            .set_read_timeout(Some(std::time::Duration::from_secs(5)))
            .unwrap();
        let mut output = OlaOutput::new(receiver.local_addr().unwrap(), 10).unwrap();

        output.write(
            &Channels::new([1.0, 0.0, 0.0, 0.0]),
            &Channels::new([0.0, 0.0, 1.0, 1.0]),
        );

        let mut buf = [0u8; decoder::MTU];
        let (size, _) = receiver.recv_from(&mut buf).unwrap();
        let packet = decoder::decode(&buf[..size]).unwrap();
        let OscPacket::Message(msg) = packet else {
            panic!("expected a message");
        };
        assert_eq!(msg.addr, "/dmx/universe/0");
        let Some(OscType::Blob(universe)) = msg.args.first() else {
            panic!("expected a blob argument");
        };
        assert_eq!(universe.len(), UNIVERSE_SIZE);
        assert_eq!(&universe[10..18], &[255, 0, 0, 0, 0, 0, 255, 255]);
        assert!(universe[..10].iter().all(|v| *v == 0));
    }

    #[test]
    fn start_slot_stays_inside_universe() {
        let output = OlaOutput::new(SocketAddr::from_str("127.0.0.1:7770").unwrap(), 9000).unwrap();
        assert_eq!(output.start_slot, UNIVERSE_SIZE - 2 * CHANNEL_COUNT);
    }
}
