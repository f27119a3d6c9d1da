//! One-shot CoAP client
//!
//! Sends a single confirmable request and waits for its response. Bodies
//! larger than one block are sent with Block1, one block per exchange.
//! Lost messages are retransmitted with the RFC 7252 exponential back-off
//! until the caller's overall timeout runs out.

use super::{code_string, uint_option_value};
use crate::constants::{DATAGRAM_BUFFER_BYTES, transmission};
use crate::{Error, Result};
use coap_lite::{
    CoapOption, ContentFormat, MessageClass, MessageType, Packet, RequestType, ResponseType,
};
use rand::Rng;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::{Instant, timeout_at};
use tracing::debug;

/// SZX for 1024-byte blocks
const CLIENT_BLOCK_SZX: u32 = 6;

/// Payloads up to this size go out in a single message
const CLIENT_BLOCK_SIZE: usize = 1 << (CLIENT_BLOCK_SZX + 4);

const TOKEN_LEN: usize = 4;

/// Send `payload` to `path` on `target` and return the final response
pub async fn send_request(
    target: SocketAddr,
    method: RequestType,
    path: &str,
    payload: &[u8],
    timeout: Duration,
) -> Result<Packet> {
    let bind_addr: SocketAddr = if target.is_ipv4() {
        SocketAddr::from(([0, 0, 0, 0], 0))
    } else {
        SocketAddr::from(([0u16; 8], 0))
    };
    let socket = UdpSocket::bind(bind_addr)
        .await
        .map_err(|e| Error::io("Failed to bind client socket", e))?;

    let deadline = Instant::now() + timeout;
    let mut message_id: u16 = rand::rng().random();
    let token: Vec<u8> = (0..TOKEN_LEN).map(|_| rand::rng().random()).collect();

    if payload.len() <= CLIENT_BLOCK_SIZE {
        let request = build_request(method, message_id, &token, path, payload);
        return exchange(&socket, target, &request, deadline).await;
    }

    let blocks: Vec<&[u8]> = payload.chunks(CLIENT_BLOCK_SIZE).collect();
    let last = blocks.len() - 1;
    for (num, chunk) in blocks.iter().enumerate() {
        let more = num < last;
        let mut request = build_request(method, message_id, &token, path, chunk);
        request.add_option(CoapOption::Block1, block1_value(num as u32, more));

        let response = exchange(&socket, target, &request, deadline).await?;
        if !more || response.header.code != MessageClass::Response(ResponseType::Continue) {
            return Ok(response);
        }
        message_id = message_id.wrapping_add(1);
    }

    Err(Error::exchange("block transfer ended without a final response"))
}

fn build_request(
    method: RequestType,
    message_id: u16,
    token: &[u8],
    path: &str,
    payload: &[u8],
) -> Packet {
    let mut request = Packet::new();
    request.header.set_type(MessageType::Confirmable);
    request.header.code = MessageClass::Request(method);
    request.header.message_id = message_id;
    request.set_token(token.to_vec());
    for segment in path.split('/').filter(|segment| !segment.is_empty()) {
        request.add_option(CoapOption::UriPath, segment.as_bytes().to_vec());
    }
    if !payload.is_empty() {
        request.set_content_format(ContentFormat::TextPlain);
        request.payload = payload.to_vec();
    }
    request
}

/// Block1 option value `NUM | M | SZX`
fn block1_value(num: u32, more: bool) -> Vec<u8> {
    uint_option_value((num << 4) | (u32::from(more) << 3) | CLIENT_BLOCK_SZX)
}

/// Send one confirmable request and wait for the matching response
async fn exchange(
    socket: &UdpSocket,
    target: SocketAddr,
    request: &Packet,
    deadline: Instant,
) -> Result<Packet> {
    let bytes = request.to_bytes()?;
    let mut retransmit_timeout = transmission::ACK_TIMEOUT;
    let mut acknowledged = false;

    for attempt in 0..=transmission::MAX_RETRANSMIT {
        if !acknowledged {
            if attempt > 0 {
                debug!(
                    "Retransmitting mid {} (attempt {})",
                    request.header.message_id, attempt
                );
            }
            socket
                .send_to(&bytes, target)
                .await
                .map_err(|e| Error::io(format!("Failed to send request to {}", target), e))?;
        }

        let attempt_deadline = std::cmp::min(Instant::now() + retransmit_timeout, deadline);
        match timeout_at(
            attempt_deadline,
            await_response(socket, target, request, &mut acknowledged),
        )
        .await
        {
            Ok(result) => return result,
            Err(_) if Instant::now() >= deadline => break,
            Err(_) => retransmit_timeout *= 2,
        }
    }

    Err(Error::exchange(format!(
        "no response from {} for {} request",
        target,
        code_string(request.header.code)
    )))
}

/// Read datagrams until the response to `request` arrives
///
/// Handles both piggybacked responses and separate responses preceded by
/// an empty ACK; a separate confirmable response is acknowledged.
async fn await_response(
    socket: &UdpSocket,
    target: SocketAddr,
    request: &Packet,
    acknowledged: &mut bool,
) -> Result<Packet> {
    let mut buf = vec![0u8; DATAGRAM_BUFFER_BYTES];

    loop {
        let (len, peer) = socket
            .recv_from(&mut buf)
            .await
            .map_err(|e| Error::io("Failed to receive response", e))?;
        if peer != target {
            continue;
        }

        let message = match Packet::from_bytes(&buf[..len]) {
            Ok(message) => message,
            Err(e) => {
                debug!("Ignoring undecodable datagram from {}: {}", peer, e);
                continue;
            }
        };

        let same_id = message.header.message_id == request.header.message_id;
        let same_token = message.get_token() == request.get_token();
        let is_response = matches!(message.header.code, MessageClass::Response(_));

        match message.header.get_type() {
            MessageType::Reset if same_id => {
                return Err(Error::exchange(format!("{} reset the exchange", target)));
            }
            MessageType::Acknowledgement if same_id => {
                if message.header.code == MessageClass::Empty {
                    *acknowledged = true;
                    continue;
                }
                if same_token {
                    return Ok(message);
                }
            }
            MessageType::Confirmable | MessageType::NonConfirmable if same_token && is_response => {
                if message.header.get_type() == MessageType::Confirmable {
                    let mut ack = Packet::new();
                    ack.header.set_type(MessageType::Acknowledgement);
                    ack.header.code = MessageClass::Empty;
                    ack.header.message_id = message.header.message_id;
                    socket
                        .send_to(&ack.to_bytes()?, target)
                        .await
                        .map_err(|e| Error::io("Failed to acknowledge response", e))?;
                }
                return Ok(message);
            }
            _ => {}
        }
    }
}
