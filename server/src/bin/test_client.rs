//! Terminal client for poking at a running server by hand.
//!
//! Commands: `queue`, `cancel`, `join <room>`, `place <row> <col>`,
//! `restart`, `quit`.

use bincode::{deserialize, serialize};
use clap::Parser;
use log::{error, warn};
use shared::{GameSnapshot, Packet, PROTOCOL_VERSION};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::UdpSocket;
use tokio::time::interval;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:8080")]
    server: String,

    /// Seconds between heartbeats
    #[arg(long, default_value = "5")]
    heartbeat: u64,
}

enum Input {
    Send(Packet),
    Quit,
}

fn parse_command(line: &str) -> Option<Input> {
    let mut words = line.split_whitespace();
    let input = match words.next()? {
        "queue" => Input::Send(Packet::JoinQueue),
        "cancel" => Input::Send(Packet::CancelQueue),
        "join" => Input::Send(Packet::JoinRoom {
            room_id: words.next()?.to_string(),
        }),
        "place" => {
            let row = words.next()?.parse().ok()?;
            let col = words.next()?.parse().ok()?;
            Input::Send(Packet::Place { row, col })
        }
        "restart" => Input::Send(Packet::Restart),
        "quit" | "exit" => Input::Quit,
        _ => return None,
    };
    Some(input)
}

fn print_state(snapshot: &GameSnapshot) {
    println!("Room {}", snapshot.room_id);
    print!("{}", snapshot.board);
    println!(
        "Black {} - White {}",
        snapshot.score.black, snapshot.score.white
    );
    match snapshot.result {
        Some(result) => println!("{}", result),
        None => println!("{} to move", snapshot.turn),
    }
    if let Some(message) = &snapshot.message {
        println!("{}", message);
    }
}

fn print_packet(packet: &Packet) {
    match packet {
        Packet::Connected { client_id } => println!("Connected as participant {}", client_id),
        Packet::Disconnected { reason } => println!("Disconnected: {}", reason),
        Packet::QueueJoined => println!("Waiting for an opponent..."),
        Packet::QueueCancelled => println!("Left the queue"),
        Packet::MatchFound { room_id, color } => {
            println!("Match found in {}, you play {}", room_id, color)
        }
        Packet::RoomFull => println!("That room is full"),
        Packet::RoomJoined { room_id, color } => println!("Joined {} as {}", room_id, color),
        Packet::State(snapshot) => print_state(snapshot),
        Packet::Invalid { reason } => println!("Rejected: {}", reason),
        Packet::Message { kind, color } => println!("{:?}: {}", kind, color),
        other => warn!("Unexpected packet: {:?}", other),
    }
}

async fn send(
    socket: &UdpSocket,
    packet: &Packet,
    addr: SocketAddr,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = serialize(packet)?;
    socket.send_to(&data, addr).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();
    let server_addr: SocketAddr = args.server.parse()?;

    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    println!("Client socket bound to {}", socket.local_addr()?);

    send(
        &socket,
        &Packet::Connect {
            client_version: PROTOCOL_VERSION,
        },
        server_addr,
    )
    .await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut heartbeat = interval(Duration::from_secs(args.heartbeat.max(1)));
    let mut buf = [0u8; 2048];

    loop {
        tokio::select! {
            result = socket.recv_from(&mut buf) => {
                match result {
                    Ok((len, _)) => match deserialize::<Packet>(&buf[0..len]) {
                        Ok(packet) => print_packet(&packet),
                        Err(e) => warn!("Failed to deserialize packet: {}", e),
                    },
                    Err(e) => error!("Error receiving packet: {}", e),
                }
            },

            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match parse_command(&line) {
                    Some(Input::Send(packet)) => send(&socket, &packet, server_addr).await?,
                    Some(Input::Quit) => break,
                    None => println!("Commands: queue | cancel | join <room> | place <row> <col> | restart | quit"),
                }
            },

            _ = heartbeat.tick() => {
                send(&socket, &Packet::Heartbeat, server_addr).await?;
            },
        }
    }

    send(&socket, &Packet::Disconnect, server_addr).await?;
    println!("Test client finished");

    Ok(())
}
