//! # Reversi Session Server Library
//!
//! Authoritative server for two-player Reversi (Othello) matches. It enforces
//! the rules, pairs players, keeps track of who plays which colour in which
//! room, and sends every participant the full game state after each change.
//!
//! ## Core Responsibilities
//!
//! ### Rule Enforcement
//! Clients only ever *ask* to place a stone. The server checks the placement
//! against the rule engine in the `shared` crate, applies the flips, decides
//! whose turn is next (including passes), and detects the end of the game.
//!
//! ### Session Coordination
//! - Matchmaking: a first-come first-served queue that pairs players into new
//!   rooms with a random colour assignment
//! - Rooms: joined by id, at most two seated players with distinct colours
//! - Restarts: a fresh board in the same room, colours unchanged
//! - Departures: leaving a running game forfeits it to the other colour
//!
//! ### State Broadcasting
//! After every state change each seated participant receives the complete
//! board, turn, last move, score and result. Reversi has no hidden
//! information, so every participant sees the same snapshot.
//!
//! ## Architecture Design
//!
//! ### Single Command Loop
//! Network tasks decode datagrams and push them into one channel. The main
//! loop owns the [`protocol::Coordinator`] and handles commands one at a time,
//! so two moves in the same room can never both see the pre-move board and a
//! pairing can never take a participant twice.
//!
//! ### Pure Dispatch
//! [`protocol::Coordinator::handle`] turns one command into a list of
//! addressed packets without doing any I/O. The transport in [`network`]
//! only decodes, routes and encodes.
//!
//! ## Module Organization
//!
//! - [`game`]: one match's state machine (moves, passes, end, restart, forfeit)
//! - [`registry`]: room ownership and the participant → room table
//! - [`matchmaking`]: the waiting queue and pairing
//! - [`protocol`]: commands in, notifications out
//! - [`client_manager`]: connected addresses, participant ids and timeouts
//! - [`network`]: UDP socket tasks and the main loop
//! - [`error`]: command rejections
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::network::{Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut server = Server::new("127.0.0.1:8080", ServerConfig::default()).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod client_manager;
pub mod error;
pub mod game;
pub mod matchmaking;
pub mod network;
pub mod protocol;
pub mod registry;
