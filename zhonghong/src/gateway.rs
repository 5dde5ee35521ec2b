//! Gateway session
//!
//! ```text
//!                 ┌──────────────── GatewaySession ────────────────┐
//!  send() ──────▶ │ writer: Mutex<Option<LinkWriter>> ──────────── │ ──▶ gateway
//!                 │                                                │
//!  callbacks ◀─── │ listener task ◀── FrameBuffer ◀── LinkReader   │ ◀── gateway
//!                 └────────────────────────────────────────────────┘
//! ```
//!
//! Every (re)open installs a fresh writer and parks a fresh reader. The
//! listener task, when running, adopts parked readers as they appear and owns
//! the one it reads from; request/reply exchanges borrow the parked reader
//! while no listener runs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::BytesMut;
use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, Notify};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info, trace, warn};

use zhonghong_core::{CtlCode, FrameBuffer, Message, Session, SessionState, StatusRecord};
use zhonghong_transport::{
    Error as TransportError, LinkReader, LinkWriter, Result as TransportResult, Transport,
};
use zhonghong_types::{Address, Attribute, FanMode, Operation, Switch};

use crate::config::GatewayConfig;
use crate::error::{Error, Result};
use crate::registry::{DeviceHandle, Registry};

/// Session with one Zhonghong gateway
///
/// Cheap to clone; clones share the same socket, listener and registries.
///
/// # Examples
///
/// ```no_run
/// use zhonghong::{GatewayConfig, GatewaySession};
///
/// # async fn run() -> zhonghong::Result<()> {
/// let gateway = GatewaySession::new(GatewayConfig::new("192.168.1.50", 9999, 1));
///
/// for address in gateway.discover().await? {
///     gateway.register_callback(address, |status| println!("{}", status));
/// }
///
/// gateway.start_listening().await?;
/// gateway.query_all_status().await;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct GatewaySession {
    inner: Arc<Inner>,
}

struct Inner {
    config: GatewayConfig,
    transport: Box<dyn Transport>,
    session: Session,
    writer: AsyncMutex<Option<LinkWriter>>,
    /// Reader of the newest link, until someone takes it
    parked: Mutex<Option<LinkReader>>,
    link_changed: Notify,
    listening: AtomicBool,
    worker: Mutex<Option<JoinHandle<()>>>,
    registry: Registry,
}

impl GatewaySession {
    /// Create a session over TCP. No socket is opened yet.
    pub fn new(config: GatewayConfig) -> Self {
        let transport = config.transport();
        Self::with_transport(config, transport)
    }

    /// Create a session over a custom transport
    pub fn with_transport(config: GatewayConfig, transport: impl Transport + 'static) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                transport: Box::new(transport),
                session: Session::new(),
                writer: AsyncMutex::new(None),
                parked: Mutex::new(None),
                link_changed: Notify::new(),
                listening: AtomicBool::new(false),
                worker: Mutex::new(None),
                registry: Registry::new(),
            }),
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.inner.config
    }

    pub fn state(&self) -> SessionState {
        self.inner.session.state()
    }

    pub fn is_listening(&self) -> bool {
        self.inner.listening.load(Ordering::Acquire)
    }

    /// (Re)open the socket
    ///
    /// An existing link is closed first and the configured reconnect delay is
    /// observed before connecting again.
    pub async fn open(&self) -> Result<()> {
        if self.close_link().await {
            let delay = self.inner.config.reconnect_delay;
            debug!("Closed previous socket, waiting {:?}", delay);
            sleep(delay).await;
        }

        info!("Opening socket to {}", self.inner.transport.remote_addr());

        let link = match self.inner.transport.connect().await {
            Ok(link) => link,
            Err(e) => {
                self.inner.session.link_lost();
                return Err(e.into());
            }
        };

        *self.inner.writer.lock().await = Some(link.writer);
        *self.inner.parked.lock() = Some(link.reader);

        let generation = self.inner.session.link_established();
        self.inner.link_changed.notify_waiters();

        debug!(generation, "Socket open");
        Ok(())
    }

    /// Drop the current link. Returns `true` if there was one.
    async fn close_link(&self) -> bool {
        let writer = self.inner.writer.lock().await.take();
        let reader = self.inner.parked.lock().take();
        let had_link = writer.is_some() || reader.is_some();

        if let Some(mut writer) = writer {
            debug!("Closing socket to {}", writer.peer());
            writer.shutdown().await;
        }

        had_link
    }

    /// Close the socket and stop the listener
    pub async fn close(&self) {
        if self.is_listening() {
            self.stop_listening().await;
        }

        self.close_link().await;
        self.inner.session.close();
        info!("Gateway {} closed", self.inner.config.gateway_address);
    }

    async fn write_frame(&self, frame: &[u8]) -> TransportResult<()> {
        let mut writer = self.inner.writer.lock().await;
        let writer = writer.as_mut().ok_or(TransportError::NotConnected)?;
        writer.send(frame, self.inner.config.write_timeout).await
    }

    /// Encode and write a message
    ///
    /// A write timeout gives up at once. Other connection failures reopen the
    /// socket and retry, up to the configured retry ceiling. Returns whether
    /// the frame was written.
    pub async fn send(&self, message: &Message) -> bool {
        let frame = message.encode();
        debug!("send >> {}", hex::encode(&frame));

        let mut retries = 0;
        loop {
            let err = match self.write_frame(&frame).await {
                Ok(()) => return true,
                Err(e) => e,
            };

            if !err.requires_reconnect() {
                error!(
                    "Cannot write to gateway {}: {}",
                    self.inner.transport.remote_addr(),
                    err
                );
                return false;
            }

            if retries >= self.inner.config.max_retry {
                error!(retries, "Giving up on {}: {}", message.header, err);
                return false;
            }

            retries += 1;
            warn!(retry = retries, "Write failed ({}), reopening socket", err);

            if let Err(e) = self.open().await {
                warn!("Reopen failed: {}", e);
            }
        }
    }

    /// Take one read from the parked reader, for request/reply exchanges
    async fn receive_reply(&self) -> TransportResult<BytesMut> {
        let taken = self.inner.parked.lock().take();
        let mut reader = taken.ok_or(TransportError::NotConnected)?;

        let result = reader
            .receive(
                self.inner.config.read_buffer_size,
                Some(self.inner.config.read_timeout),
            )
            .await;

        let broken = matches!(&result, Err(e) if e.requires_reconnect());
        if !broken {
            let mut slot = self.inner.parked.lock();
            // A reopen while we were reading parks a newer reader
            if slot.is_none() {
                *slot = Some(reader);
            }
        }

        result
    }

    /// Discover the indoor units behind the gateway
    ///
    /// Sends discovery requests until a matching online report arrives or the
    /// attempts run out. Not available while the listener runs, because the
    /// listener consumes every frame.
    pub async fn discover(&self) -> Result<Vec<Address>> {
        if self.is_listening() {
            return Err(Error::AlreadyListening);
        }

        if !self.inner.session.is_connected() {
            self.open().await?;
        }

        let request = Message::discovery_request(self.inner.config.gateway_address);
        let mut frames = FrameBuffer::new();

        for attempt in 1..=self.inner.config.discovery_attempts {
            debug!(attempt, "send discovery request: {}", request.hex());

            if !self.send(&request).await {
                continue;
            }

            let data = match self.receive_reply().await {
                Ok(data) => data,
                Err(e) if e.requires_reconnect() => {
                    warn!("Lost gateway during discovery: {}", e);
                    if let Err(e) = self.open().await {
                        warn!("Reopen failed: {}", e);
                    }
                    continue;
                }
                Err(e) => {
                    debug!(attempt, "No discovery reply: {}", e);
                    continue;
                }
            };

            let mut found = Vec::new();
            let mut matched = false;

            for frame in frames.push(&data) {
                match Message::decode(&frame) {
                    Ok(reply) if reply.header.matches(&request.header) => {
                        matched = true;
                        found.extend(reply.online_records().map(|record| record.address));
                    }
                    Ok(reply) => {
                        debug!("header not match: {} != {}", request.header, reply.header)
                    }
                    Err(e) => debug!("Dropping frame {}: {}", hex::encode(&frame), e),
                }
            }

            if matched {
                info!("Discovered {} units", found.len());
                return Ok(found);
            }
        }

        warn!(
            "No discovery reply after {} attempts",
            self.inner.config.discovery_attempts
        );
        Ok(Vec::new())
    }

    /// Start the background listener
    ///
    /// Opens the socket if needed. Calling this while already listening is a
    /// no-op.
    pub async fn start_listening(&self) -> Result<()> {
        if self.inner.listening.swap(true, Ordering::AcqRel) {
            debug!("Listener already running");
            return Ok(());
        }

        let started = async {
            if !self.inner.session.is_connected() {
                self.open().await?;
            }
            self.inner.session.begin_listening()?;
            Ok::<_, Error>(())
        };

        if let Err(e) = started.await {
            self.inner.listening.store(false, Ordering::Release);
            return Err(e);
        }

        let session = self.clone();
        let handle = tokio::spawn(async move { session.listen().await });
        *self.inner.worker.lock() = Some(handle);

        info!("Listening to gateway {}", self.inner.transport.remote_addr());
        Ok(())
    }

    /// Stop the background listener and close the socket
    ///
    /// Returns once the listener task has finished.
    pub async fn stop_listening(&self) {
        debug!("Stopping listener");
        self.inner.listening.store(false, Ordering::Release);
        self.inner.link_changed.notify_waiters();

        info!("Closing socket.");
        self.close_link().await;

        let worker = self.inner.worker.lock().take();
        if let Some(worker) = worker {
            if let Err(e) = worker.await {
                warn!("Listener task failed: {}", e);
            }
        }

        // The listener may have reopened the socket before it saw the flag
        self.close_link().await;

        if let Err(e) = self.inner.session.end_listening() {
            trace!("{}", e);
        }
        self.inner.session.link_lost();
    }

    async fn listen(&self) {
        let mut frames = FrameBuffer::new();
        let mut reader: Option<LinkReader> = None;

        loop {
            let changed = self.inner.link_changed.notified();
            tokio::pin!(changed);
            changed.as_mut().enable();

            if !self.inner.listening.load(Ordering::Acquire) {
                break;
            }

            let fresh = self.inner.parked.lock().take();
            if let Some(fresh) = fresh {
                trace!("Listener adopted socket to {}", fresh.peer());
                reader = Some(fresh);
                frames.clear();
            }

            let Some(active) = reader.as_mut() else {
                self.reopen_for_listener().await;
                continue;
            };

            let outcome = tokio::select! {
                _ = &mut changed => None,
                result = active.receive(self.inner.config.read_buffer_size, None) => Some(result),
            };

            match outcome {
                None => continue,
                Some(Ok(data)) => self.handle_data(&mut frames, &data),
                Some(Err(e)) if e.requires_reconnect() => {
                    debug!("Read failed ({}), reopening socket", e);
                    reader = None;
                    if self.inner.listening.load(Ordering::Acquire) {
                        self.reopen_for_listener().await;
                    }
                }
                Some(Err(e)) => warn!("Read error: {}", e),
            }
        }

        debug!("Listener stopped");
    }

    async fn reopen_for_listener(&self) {
        if let Err(e) = self.open().await {
            warn!("Cannot reopen socket: {}", e);
            sleep(self.inner.config.reconnect_delay).await;
        }
    }

    fn handle_data(&self, frames: &mut FrameBuffer, data: &[u8]) {
        trace!("recv << {}", hex::encode(data));

        for frame in frames.push(data) {
            match Message::decode(&frame) {
                Ok(message) => self.dispatch(&message),
                Err(e) => warn!("Dropping frame {}: {}", hex::encode(&frame), e),
            }
        }
    }

    fn dispatch(&self, message: &Message) {
        match message.header.ctl_code {
            CtlCode::Status(kind) if kind.carries_status() => {
                for record in message.status_records() {
                    trace!("{}", record);
                    self.inner.registry.dispatch_status(record);
                }
            }
            CtlCode::Status(kind) => debug!("Ignoring {:?} report outside discovery", kind),
            CtlCode::Control(attribute) => {
                for record in &message.records {
                    self.inner
                        .registry
                        .dispatch_echo(record.address(), attribute);
                }
            }
        }
    }

    /// Ask for the status of one unit
    pub async fn query_status(&self, address: Address) -> bool {
        let message = Message::status_query(self.inner.config.gateway_address, address);
        self.send(&message).await
    }

    /// Ask for the status of every unit
    pub async fn query_all_status(&self) -> bool {
        let message = Message::all_status_query(self.inner.config.gateway_address);
        self.send(&message).await
    }

    /// Send a control command for one unit
    pub async fn control(&self, address: Address, attribute: Attribute) -> bool {
        debug!("{} set {}", address, attribute);
        let message = Message::control(self.inner.config.gateway_address, address, attribute);
        self.send(&message).await
    }

    pub async fn turn_on(&self, address: Address) -> bool {
        self.control(address, Attribute::Power(Switch::On)).await
    }

    pub async fn turn_off(&self, address: Address) -> bool {
        self.control(address, Attribute::Power(Switch::Off)).await
    }

    pub async fn set_temperature(&self, address: Address, celsius: u8) -> bool {
        let attribute = Attribute::TargetTemperature(celsius);
        self.control(address, attribute).await
    }

    pub async fn set_operation(&self, address: Address, operation: Operation) -> bool {
        self.control(address, Attribute::Operation(operation)).await
    }

    pub async fn set_fan_mode(&self, address: Address, fan_mode: FanMode) -> bool {
        self.control(address, Attribute::FanMode(fan_mode)).await
    }

    /// Call `callback` for every status report of `address`
    pub fn register_callback<F>(&self, address: Address, callback: F)
    where
        F: Fn(&StatusRecord) + Send + Sync + 'static,
    {
        self.inner
            .registry
            .add_status_callback(address, Arc::new(callback));
    }

    /// Call `callback` for every control echo of `address`
    pub fn register_echo_callback<F>(&self, address: Address, callback: F)
    where
        F: Fn(Address, Attribute) + Send + Sync + 'static,
    {
        self.inner
            .registry
            .add_echo_callback(address, Arc::new(callback));
    }

    /// Register the device object that receives control echoes for `address`
    pub fn register_device(&self, address: Address, device: Arc<dyn DeviceHandle>) {
        if self.inner.registry.add_device(address, device).is_some() {
            debug!("{} device replaced", address);
        }
    }

    pub fn lookup_device(&self, address: Address) -> Option<Arc<dyn DeviceHandle>> {
        self.inner.registry.device(address)
    }
}
