//! Server network layer: UDP transport around the game coordinator

use crate::client_manager::ClientManager;
use crate::protocol::{Command, Coordinator, Notification};
use bincode::{deserialize, serialize};
use log::{debug, error, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use shared::{Packet, PROTOCOL_VERSION};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, RwLock};

/// Runtime settings for [`Server`]
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub max_clients: usize,
    /// Clients silent for longer than this are disconnected
    pub client_timeout: Duration,
    /// Fixed seed for colour coin flips and room ids; random when `None`
    pub seed: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_clients: 64,
            client_timeout: Duration::from_secs(30),
            seed: None,
        }
    }
}

/// Messages sent from network tasks to main server loop
#[derive(Debug)]
pub enum ServerMessage {
    PacketReceived { packet: Packet, addr: SocketAddr },
    ClientTimeout { client_id: u32 },
    Shutdown,
}

/// Outgoing datagrams queued for the sender task
#[derive(Debug)]
pub struct Outgoing {
    pub packet: Packet,
    pub addr: SocketAddr,
}

/// Main server: owns the coordinator and feeds it one command at a time
pub struct Server {
    socket: Arc<UdpSocket>,
    clients: Arc<RwLock<ClientManager>>,
    coordinator: Coordinator<StdRng>,

    // Communication channels
    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
    outgoing_tx: mpsc::UnboundedSender<Outgoing>,
    outgoing_rx: Option<mpsc::UnboundedReceiver<Outgoing>>,
}

impl Server {
    pub async fn new(addr: &str, config: ServerConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = Arc::new(UdpSocket::bind(addr).await?);
        info!("Server listening on {}", socket.local_addr()?);

        let rng = match config.seed {
            Some(seed) => {
                info!("Using fixed RNG seed {}", seed);
                StdRng::seed_from_u64(seed)
            }
            None => StdRng::from_entropy(),
        };

        let (server_tx, server_rx) = mpsc::unbounded_channel();
        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();

        Ok(Server {
            socket,
            clients: Arc::new(RwLock::new(ClientManager::new(
                config.max_clients,
                config.client_timeout,
            ))),
            coordinator: Coordinator::new(rng),
            server_tx,
            server_rx,
            outgoing_tx,
            outgoing_rx: Some(outgoing_rx),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Handle for stopping [`Server::run`] from another task
    pub fn shutdown_handle(&self) -> mpsc::UnboundedSender<ServerMessage> {
        self.server_tx.clone()
    }

    /// Spawns task that continuously listens for incoming packets
    fn spawn_network_receiver(&self) {
        let socket = Arc::clone(&self.socket);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut buffer = [0u8; 2048];

            loop {
                match socket.recv_from(&mut buffer).await {
                    Ok((len, addr)) => {
                        if let Ok(packet) = deserialize::<Packet>(&buffer[0..len]) {
                            if let Err(e) =
                                server_tx.send(ServerMessage::PacketReceived { packet, addr })
                            {
                                error!("Failed to send packet to main loop: {}", e);
                                break;
                            }
                        } else {
                            warn!("Failed to deserialize packet from {}", addr);
                        }
                    }
                    Err(e) => {
                        error!("Error receiving packet: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });
    }

    /// Spawns task that drains the outgoing packet queue
    fn spawn_network_sender(&mut self) {
        let socket = Arc::clone(&self.socket);
        let Some(mut outgoing_rx) = self.outgoing_rx.take() else {
            return;
        };

        tokio::spawn(async move {
            while let Some(Outgoing { packet, addr }) = outgoing_rx.recv().await {
                if let Err(e) = Self::send_packet_impl(&socket, &packet, addr).await {
                    error!("Failed to send packet to {}: {}", addr, e);
                }
            }
        });
    }

    /// Spawns task that monitors client timeouts
    fn spawn_timeout_checker(&self) {
        let clients = Arc::clone(&self.clients);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));

            loop {
                interval.tick().await;

                let timed_out = {
                    let mut clients_guard = clients.write().await;
                    clients_guard.check_timeouts()
                };

                for client_id in timed_out {
                    if let Err(e) = server_tx.send(ServerMessage::ClientTimeout { client_id }) {
                        error!("Failed to send timeout message: {}", e);
                        return;
                    }
                }
            }
        });
    }

    async fn send_packet_impl(
        socket: &UdpSocket,
        packet: &Packet,
        addr: SocketAddr,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let data = serialize(packet)?;
        socket.send_to(&data, addr).await?;
        Ok(())
    }

    fn send_packet(&self, packet: Packet, addr: SocketAddr) {
        if let Err(e) = self.outgoing_tx.send(Outgoing { packet, addr }) {
            error!("Failed to queue packet for sending: {}", e);
        }
    }

    /// Routes coordinator output to the participants' addresses
    async fn deliver(&self, notifications: Vec<Notification>) {
        let clients = self.clients.read().await;
        for Notification { recipient, packet } in notifications {
            match clients.addr_of(recipient) {
                Some(addr) => self.send_packet(packet, addr),
                None => debug!("Dropping packet for departed client {}", recipient),
            }
        }
    }

    /// Runs a command through the coordinator and sends what comes out
    async fn dispatch(&mut self, client_id: u32, command: Command) {
        let notifications = self.coordinator.handle(client_id, command);
        self.deliver(notifications).await;
    }

    async fn handle_packet(&mut self, packet: Packet, addr: SocketAddr) {
        if let Packet::Connect { client_version } = packet {
            self.handle_connect(client_version, addr).await;
            return;
        }

        let client_id = {
            let mut clients = self.clients.write().await;
            let client_id = clients.find_client_by_addr(addr);
            if let Some(id) = client_id {
                clients.touch(id);
            }
            client_id
        };

        let Some(client_id) = client_id else {
            warn!("Packet from unknown address {}", addr);
            return;
        };

        match Command::from_packet(&packet) {
            Some(Command::Disconnect) => {
                self.dispatch(client_id, Command::Disconnect).await;
                self.clients.write().await.remove_client(&client_id);
            }
            Some(command) => self.dispatch(client_id, command).await,
            None => {
                if !matches!(packet, Packet::Heartbeat) {
                    warn!("Unexpected packet type from client {}", client_id);
                }
            }
        }
    }

    async fn handle_connect(&mut self, client_version: u32, addr: SocketAddr) {
        info!(
            "Client connecting from {} (version: {})",
            addr, client_version
        );

        if client_version != PROTOCOL_VERSION {
            self.send_packet(
                Packet::Disconnected {
                    reason: "Protocol version mismatch".to_string(),
                },
                addr,
            );
            return;
        }

        // Remove existing connection if present
        let existing_client_id = {
            let clients = self.clients.read().await;
            clients.find_client_by_addr(addr)
        };

        if let Some(existing_id) = existing_client_id {
            info!("Replacing existing client {} from {}", existing_id, addr);
            self.dispatch(existing_id, Command::Disconnect).await;
            self.clients.write().await.remove_client(&existing_id);
        }

        let client_id = {
            let mut clients = self.clients.write().await;
            clients.add_client(addr)
        };

        let response = match client_id {
            Some(client_id) => Packet::Connected { client_id },
            None => Packet::Disconnected {
                reason: "Server full".to_string(),
            },
        };
        self.send_packet(response, addr);
    }

    /// Main server loop.
    ///
    /// Every command from every client goes through this one loop, which is
    /// what keeps moves, joins and pairings strictly ordered.
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.spawn_network_receiver();
        self.spawn_network_sender();
        self.spawn_timeout_checker();

        info!("Server started successfully");

        loop {
            match self.server_rx.recv().await {
                Some(ServerMessage::PacketReceived { packet, addr }) => {
                    self.handle_packet(packet, addr).await;
                }
                Some(ServerMessage::ClientTimeout { client_id }) => {
                    info!("Client {} timed out", client_id);
                    let notifications = self.coordinator.handle(client_id, Command::Disconnect);
                    self.deliver(notifications).await;
                }
                Some(ServerMessage::Shutdown) | None => {
                    info!("Server shutting down");
                    break;
                }
            }
        }

        Ok(())
    }
}
