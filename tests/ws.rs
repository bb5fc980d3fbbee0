use std::{sync::Arc, time::Duration};

use anyhow::Result;
use bytes::BytesMut;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
    time::sleep,
};
use ws_server::config::{Config, Server};

const BIND: &str = "127.0.0.1:19333";

const UPGRADE_REQUEST: &[u8] = b"GET / HTTP/1.1\r\n\
Host: localhost\r\n\
Upgrade: websocket\r\n\
Connection: Upgrade\r\n\
Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n\
Sec-WebSocket-Version: 13\r\n\r\n";

/// Read until the HTTP response head is complete.
async fn read_head(socket: &mut TcpStream) -> Result<String> {
    let mut buffer = BytesMut::with_capacity(4096);

    loop {
        if socket.read_buf(&mut buffer).await? == 0 {
            anyhow::bail!("connection closed during handshake");
        }

        if buffer.windows(4).any(|window| window == b"\r\n\r\n") {
            return Ok(String::from_utf8(buffer.to_vec())?);
        }
    }
}

#[tokio::test]
async fn test_ws_server() -> Result<()> {
    let config = Arc::new(Config {
        server: Server {
            interfaces: vec![BIND.parse()?],
        },
        ..Default::default()
    });

    tokio::spawn(ws_server::startup(config));

    // Wait for the listener to come up.
    let mut socket = loop {
        sleep(Duration::from_millis(100)).await;

        if let Ok(socket) = TcpStream::connect(BIND).await {
            break socket;
        }
    };

    // Opening handshake.
    socket.write_all(UPGRADE_REQUEST).await?;

    let head = read_head(&mut socket).await?;
    assert!(head.starts_with("HTTP/1.1 101 Switching Protocols\r\n"));
    assert!(head.contains("Sec-WebSocket-Accept: s3pPLMBiTxaQ9kYGzzhZRbK+xOo=\r\n"));

    // Masked text frame carrying "Hello".
    let key = [0x37, 0xfa, 0x21, 0x3d];
    let mut frame = vec![0x81u8, 0x80 | 5];
    frame.extend_from_slice(&key);
    frame.extend_from_slice(
        &b"Hello"
            .iter()
            .enumerate()
            .map(|(i, byte)| byte ^ key[i % 4])
            .collect::<Vec<u8>>(),
    );

    socket.write_all(&frame).await?;

    // The echo comes back as a final, unmasked text frame.
    let mut echo = [0u8; 7];
    socket.read_exact(&mut echo).await?;
    assert_eq!(&echo, &[0x81, 0x05, b'H', b'e', b'l', b'l', b'o']);

    // Two frames in one segment are both answered.
    socket.write_all(&[frame.clone(), frame].concat()).await?;

    let mut echo = [0u8; 14];
    socket.read_exact(&mut echo).await?;
    assert_eq!(&echo[..7], &echo[7..]);
    assert_eq!(&echo[..7], &[0x81, 0x05, b'H', b'e', b'l', b'l', b'o']);

    // An unmasked client frame is a protocol violation; the server
    // drops the connection without replying.
    socket.write_all(&[0x81, 0x05, b'H', b'e', b'l', b'l', b'o']).await?;

    let mut buffer = [0u8; 16];
    assert_eq!(socket.read(&mut buffer).await.unwrap_or(0), 0);

    Ok(())
}
