use std::net::SocketAddr;

use allping::message::MessageKind;
use allping::socket::PeerSocket;

// Send one raw datagram to a running allping, e.g. to check that a malformed
// message aborts the run:
//
//   sendmsg 127.0.0.1:34567 X
//   sendmsg 127.0.0.1:34567 PING 34568
fn main() {
    let mut args = std::env::args().skip(1);
    let (Some(target), Some(payload)) = (args.next(), args.next()) else {
        eprintln!("usage: sendmsg <address:port> <payload|PING|PONG> [source-port]");
        std::process::exit(2);
    };
    let target: SocketAddr = target.parse().expect("invalid target address");
    let source_port: u16 = args.next().map_or(0, |port| port.parse().expect("invalid source port"));

    let payload: &[u8] = match payload.as_str() {
        "PING" => MessageKind::Ping.as_bytes(),
        "PONG" => MessageKind::Pong.as_bytes(),
        other => other.as_bytes(),
    };

    let socket = PeerSocket::bind_any(target.ip(), source_port).expect("bind failed");
    let sent = socket.send_to(payload, target).expect("sendto failed");
    println!("sent {} bytes to {}", sent, target);
}
