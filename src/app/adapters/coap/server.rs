//! UDP listener speaking CoAP to reporting devices
//!
//! One task is spawned per received datagram. A task decodes the message,
//! drops or replays duplicates, lets the block handler reassemble Block1
//! bodies, runs the report handler and sends exactly one reply. Tasks share
//! the socket, the handler, the block handler and the exchange cache.

use super::exchange_cache::{Admission, ExchangeCache, ExchangeKey};
use super::{code_string, request_method, uint_option_value};
use crate::app::models::Route;
use crate::app::services::request_handler::{Reply, ReplyStatus, ReportHandler, RequestMethod};
use crate::constants::{DATAGRAM_BUFFER_BYTES, responses, transmission};
use crate::{Error, Result};
use coap_lite::{
    BlockHandler, BlockHandlerConfig, CoapOption, CoapRequest, ContentFormat, MessageClass,
    MessageType, Packet, ResponseType,
};
use rand::Rng;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// CoAP response code for a handler reply
pub fn reply_status(status: ReplyStatus) -> ResponseType {
    match status {
        ReplyStatus::Success => ResponseType::Content,
        ReplyStatus::BadRequest => ResponseType::BadRequest,
        ReplyStatus::MethodNotAllowed => ResponseType::MethodNotAllowed,
        ReplyStatus::ServerError => ResponseType::InternalServerError,
    }
}

/// State shared by every request task
struct ServerContext {
    socket: Arc<UdpSocket>,
    handler: ReportHandler,
    max_body_bytes: usize,
    blocks: Mutex<BlockHandler<SocketAddr>>,
    exchanges: Mutex<ExchangeCache>,
    next_message_id: AtomicU16,
}

pub struct CoapServer {
    context: Arc<ServerContext>,
    local_addr: SocketAddr,
}

impl CoapServer {
    /// Bind the listener socket
    pub async fn bind(addr: SocketAddr, handler: ReportHandler, max_body_bytes: usize) -> Result<Self> {
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|e| Error::io(format!("Failed to bind UDP socket on {}", addr), e))?;
        let local_addr = socket
            .local_addr()
            .map_err(|e| Error::io("Failed to read bound socket address", e))?;

        let block_config = BlockHandlerConfig {
            max_total_message_size: max_body_bytes,
            cache_expiry_duration: transmission::BLOCK1_ASSEMBLY_LIFETIME,
        };

        let context = ServerContext {
            socket: Arc::new(socket),
            handler,
            max_body_bytes,
            blocks: Mutex::new(BlockHandler::new(block_config)),
            exchanges: Mutex::new(ExchangeCache::new(
                transmission::EXCHANGE_LIFETIME,
                transmission::EXCHANGE_CACHE_CAPACITY,
            )),
            next_message_id: AtomicU16::new(rand::rng().random()),
        };

        Ok(Self {
            context: Arc::new(context),
            local_addr,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Receive and serve datagrams until `shutdown` is cancelled
    pub async fn run(self, shutdown: CancellationToken) -> Result<()> {
        info!("CoAP server listening on udp://{}", self.local_addr);
        let mut buf = vec![0u8; DATAGRAM_BUFFER_BYTES];

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("CoAP server on {} shutting down", self.local_addr);
                    break;
                }
                received = self.context.socket.recv_from(&mut buf) => {
                    let (len, peer) = match received {
                        Ok(received) => received,
                        Err(e) => {
                            // ICMP errors from earlier sends surface here on some platforms
                            warn!("UDP receive failed: {}", e);
                            continue;
                        }
                    };

                    let datagram = buf[..len].to_vec();
                    let context = Arc::clone(&self.context);
                    tokio::spawn(async move {
                        context.process_datagram(peer, datagram).await;
                    });
                }
            }
        }

        Ok(())
    }
}

impl ServerContext {
    async fn process_datagram(&self, peer: SocketAddr, datagram: Vec<u8>) {
        let packet = match Packet::from_bytes(&datagram) {
            Ok(packet) => packet,
            Err(e) => {
                debug!("Dropping undecodable datagram from {}: {}", peer, e);
                if let Some(message_id) = confirmable_message_id(&datagram) {
                    self.send_reset(peer, message_id).await;
                }
                return;
            }
        };

        let message_type = packet.header.get_type();
        let message_id = packet.header.message_id;
        let confirmable = message_type == MessageType::Confirmable;

        if matches!(
            message_type,
            MessageType::Acknowledgement | MessageType::Reset
        ) {
            debug!("Ignoring {:?} {} from {}", message_type, message_id, peer);
            return;
        }

        match packet.header.code {
            MessageClass::Request(_) => {}
            MessageClass::Empty => {
                if confirmable {
                    debug!("Answering CoAP ping from {}", peer);
                    self.send_reset(peer, message_id).await;
                }
                return;
            }
            other => {
                debug!(
                    "Rejecting {:?} with code {} from {}",
                    message_type,
                    code_string(other),
                    peer
                );
                if confirmable {
                    self.send_reset(peer, message_id).await;
                }
                return;
            }
        }

        let key: ExchangeKey = (peer, message_id);
        let admission = self.lock_exchanges().admit(key, Instant::now());
        match admission {
            Admission::New => {}
            Admission::InFlight => {
                debug!("Duplicate mid {} from {} still in progress", message_id, peer);
                return;
            }
            Admission::Replay(bytes) => {
                debug!("Replaying response to duplicate mid {} from {}", message_id, peer);
                self.send_bytes(peer, &bytes).await;
                return;
            }
        }

        let encoded = self
            .respond(peer, packet)
            .await
            .map(|response| response.to_bytes());

        match encoded {
            Some(Ok(bytes)) => {
                self.lock_exchanges().complete(key, bytes.clone());
                self.send_bytes(peer, &bytes).await;
            }
            Some(Err(e)) => {
                error!("Failed to encode response for {}: {}", peer, e);
                self.lock_exchanges().abandon(key);
            }
            None => self.lock_exchanges().abandon(key),
        }
    }

    /// Build the single response for a request
    async fn respond(&self, peer: SocketAddr, packet: Packet) -> Option<Packet> {
        let mut request = CoapRequest::from_packet(packet, peer);
        let path = request.get_path();
        let route = Route::from_path(&path);
        let method = request_method(request.get_method());
        let non_confirmable = request.message.header.get_type() == MessageType::NonConfirmable;

        debug!(
            "{} /{} from {} (mid {}, {} bytes)",
            method,
            path,
            peer,
            request.message.header.message_id,
            request.message.payload.len()
        );

        if method != RequestMethod::Submit {
            let reply = self.handler.handle(method, route, &[]).await;
            apply_reply(&mut request, &reply);
        } else if request.message.get_option(CoapOption::Block1).is_none()
            && request.message.payload.len() > self.max_body_bytes
        {
            self.reject_too_large(&mut request);
        } else {
            let intercepted = self.lock_blocks().intercept_request(&mut request);
            match intercepted {
                Ok(true) => clear_continue_payload(&mut request),
                Ok(false) => {
                    let body = std::mem::take(&mut request.message.payload);
                    let reply = self.handler.handle(method, route, &body).await;
                    apply_reply(&mut request, &reply);
                }
                Err(e) => {
                    warn!("Block transfer from {} rejected: {}", peer, e.message);
                    let status = e.code.unwrap_or(ResponseType::BadRequest);
                    set_text_response(&mut request, status, &e.message);
                }
            }
        }

        let mut response = request.response?.message;
        if non_confirmable {
            response.header.message_id = self.fresh_message_id();
        }
        Some(response)
    }

    fn reject_too_large(&self, request: &mut CoapRequest<SocketAddr>) {
        set_text_response(
            request,
            ResponseType::RequestEntityTooLarge,
            responses::BODY_TOO_LARGE,
        );
        if let Some(response) = request.response.as_mut() {
            let limit = u32::try_from(self.max_body_bytes).unwrap_or(u32::MAX);
            response
                .message
                .add_option(CoapOption::Size1, uint_option_value(limit));
        }
    }

    fn fresh_message_id(&self) -> u16 {
        self.next_message_id.fetch_add(1, Ordering::Relaxed)
    }

    fn lock_blocks(&self) -> MutexGuard<'_, BlockHandler<SocketAddr>> {
        self.blocks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_exchanges(&self) -> MutexGuard<'_, ExchangeCache> {
        self.exchanges
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn send_reset(&self, peer: SocketAddr, message_id: u16) {
        match reset_packet(message_id).to_bytes() {
            Ok(bytes) => self.send_bytes(peer, &bytes).await,
            Err(e) => error!("Failed to encode reset for {}: {}", peer, e),
        }
    }

    async fn send_bytes(&self, peer: SocketAddr, bytes: &[u8]) {
        match self.socket.send_to(bytes, peer).await {
            Ok(_) => debug!("Sent {} bytes to {}", bytes.len(), peer),
            Err(e) => warn!("Failed to send response to {}: {}", peer, e),
        }
    }
}

fn apply_reply(request: &mut CoapRequest<SocketAddr>, reply: &Reply) {
    set_text_response(request, reply_status(reply.status), &reply.body);
}

fn set_text_response(request: &mut CoapRequest<SocketAddr>, status: ResponseType, body: &str) {
    if let Some(response) = request.response.as_mut() {
        response.set_status(status);
        response.message.set_content_format(ContentFormat::TextPlain);
        response.message.payload = body.as_bytes().to_vec();
    }
}

/// Intermediate Block1 acknowledgements carry no body
fn clear_continue_payload(request: &mut CoapRequest<SocketAddr>) {
    if let Some(response) = request.response.as_mut() {
        if *response.get_status() == ResponseType::Continue {
            response.message.payload.clear();
        }
    }
}

fn reset_packet(message_id: u16) -> Packet {
    let mut packet = Packet::new();
    packet.header.set_type(MessageType::Reset);
    packet.header.code = MessageClass::Empty;
    packet.header.message_id = message_id;
    packet
}

/// Message id of a datagram that at least looks like a CoAP CON header
fn confirmable_message_id(datagram: &[u8]) -> Option<u16> {
    if datagram.len() < 4 || datagram[0] >> 6 != 1 || (datagram[0] >> 4) & 0x03 != 0 {
        return None;
    }
    Some(u16::from_be_bytes([datagram[2], datagram[3]]))
}
