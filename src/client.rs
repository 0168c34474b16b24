// src/client.rs
//
// The macdc client: binds its own local path before connecting, then runs a
// sender and a receiver concurrently. Grounded on original_source/macD_c.c's
// start_client/client_sender/client_reciever, with the source's global,
// mutex-guarded STATE variable replaced by a tokio::sync::watch shared
// between the two tasks, and the index-accumulator bug (`x = x*10 + r`,
// where `r` is a read count, not the parsed digit) deliberately not
// reproduced, per spec.md §9's open question.

use std::ffi::CString;
use std::io;
use std::mem;
use std::os::unix::io::{FromRawFd, RawFd};
use std::os::unix::net::UnixStream as StdUnixStream;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tokio::sync::{mpsc, watch};

use crate::control_plane::{CLIENT_SOCKET_PATH, SERVER_SOCKET_PATH};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expectation {
    Stat,
    Echo,
}

/// Binds `macd.socket.client` then connects to `macd.socket.server`. Binding
/// a specific local address before connect isn't exposed by
/// std::os::unix::net::UnixStream or tokio::net::UnixStream, so this one
/// step uses raw libc socket/bind/connect calls; everything after is handed
/// off to a plain tokio::net::UnixStream.
pub fn connect() -> io::Result<UnixStream> {
    unsafe {
        let fd: RawFd = libc::socket(libc::AF_UNIX, libc::SOCK_STREAM, 0);
        if fd < 0 {
            return Err(io::Error::last_os_error());
        }

        let _ = std::fs::remove_file(CLIENT_SOCKET_PATH);
        if let Err(e) = bind_local(fd, CLIENT_SOCKET_PATH) {
            libc::close(fd);
            return Err(e);
        }
        if let Err(e) = connect_to(fd, SERVER_SOCKET_PATH) {
            libc::close(fd);
            return Err(e);
        }

        let std_stream = StdUnixStream::from_raw_fd(fd);
        std_stream.set_nonblocking(true)?;
        UnixStream::from_std(std_stream)
    }
}

fn make_sockaddr_un(path: &str) -> io::Result<(libc::sockaddr_un, libc::socklen_t)> {
    let mut addr: libc::sockaddr_un = unsafe { mem::zeroed() };
    addr.sun_family = libc::AF_UNIX as libc::sa_family_t;
    let c_path = CString::new(path)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "path contains a NUL byte"))?;
    let bytes = c_path.as_bytes_with_nul();
    if bytes.len() > addr.sun_path.len() {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "socket path too long"));
    }
    for (dst, src) in addr.sun_path.iter_mut().zip(bytes.iter()) {
        *dst = *src as libc::c_char;
    }
    let len = mem::size_of::<libc::sockaddr_un>() as libc::socklen_t;
    Ok((addr, len))
}

unsafe fn bind_local(fd: RawFd, path: &str) -> io::Result<()> {
    let (addr, len) = make_sockaddr_un(path)?;
    let rc = libc::bind(fd, &addr as *const _ as *const libc::sockaddr, len);
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

unsafe fn connect_to(fd: RawFd, path: &str) -> io::Result<()> {
    let (addr, len) = make_sockaddr_un(path)?;
    let rc = libc::connect(fd, &addr as *const _ as *const libc::sockaddr, len);
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Drives the Sender/Receiver pair over an already-connected stream until
/// either side hits EOF or an I/O error.
pub async fn run_session(stream: UnixStream) -> io::Result<()> {
    let (mut read_half, mut write_half) = stream.into_split();
    let (expectation_tx, expectation_rx) = watch::channel(Expectation::Echo);
    let (bytes_tx, mut bytes_rx) = mpsc::channel::<[u8; 4]>(1);

    let writer = tokio::spawn(async move {
        while let Some(buf) = bytes_rx.recv().await {
            if write_half.write_all(&buf).await.is_err() {
                break;
            }
        }
    });

    let receiver = tokio::spawn(async move {
        loop {
            let mut buf = [0u8; 4];
            if read_half.read_exact(&mut buf).await.is_err() {
                eprintln!("Recieve Error");
                return;
            }
            match *expectation_rx.borrow() {
                Expectation::Stat => {
                    let value = i32::from_le_bytes(buf);
                    println!("There are {} running processes", value);
                }
                Expectation::Echo => {
                    println!("Echo From Server: {}", String::from_utf8_lossy(&buf));
                }
            }
        }
    });

    sender_loop(bytes_tx, expectation_tx).await;
    let _ = receiver.await;
    let _ = writer.await;
    Ok(())
}

async fn sender_loop(bytes_tx: mpsc::Sender<[u8; 4]>, expectation_tx: watch::Sender<Expectation>) {
    let mut awaiting_index = false;
    loop {
        if !awaiting_index {
            let Some(buf) = read_four_bytes().await else {
                return;
            };
            let mut lower = buf;
            lower.make_ascii_lowercase();
            if &lower == b"kill" {
                awaiting_index = true;
            } else if &lower == b"stat" {
                let _ = expectation_tx.send(Expectation::Stat);
            } else {
                let _ = expectation_tx.send(Expectation::Echo);
            }
            if bytes_tx.send(lower).await.is_err() {
                return;
            }
        } else {
            let Some(value) = read_decimal_index().await else {
                return;
            };
            let _ = expectation_tx.send(Expectation::Echo);
            if bytes_tx.send(value.to_le_bytes()).await.is_err() {
                return;
            }
            awaiting_index = false;
        }
    }
}

async fn read_four_bytes() -> Option<[u8; 4]> {
    tokio::task::spawn_blocking(|| {
        use std::io::Read;
        let mut buf = [0u8; 4];
        std::io::stdin().lock().read_exact(&mut buf).ok()?;
        Some(buf)
    })
    .await
    .ok()
    .flatten()
}

async fn read_decimal_index() -> Option<u32> {
    tokio::task::spawn_blocking(|| {
        use std::io::Read;
        let mut stdin = std::io::stdin();
        let mut value: u32 = 0;
        let mut got_digit = false;
        let mut byte = [0u8; 1];
        loop {
            match stdin.read_exact(&mut byte) {
                Ok(()) => {
                    let c = byte[0];
                    if c.is_ascii_digit() {
                        got_digit = true;
                        value = value.saturating_mul(10).saturating_add((c - b'0') as u32);
                    } else {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
        if got_digit {
            Some(value)
        } else {
            None
        }
    })
    .await
    .ok()
    .flatten()
}
