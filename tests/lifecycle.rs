//! Listen, close and drain behaviour.

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use fanout::config::parse_config;
use fanout::{Error, Inbound, Network, Server};
use tokio::net::TcpStream;
use tokio::sync::watch;

mod common;
use common::WAIT;

async fn noop(_inbound: Inbound<()>) {}

#[tokio::test]
async fn close_unblocks_serve() {
    common::init_tracing();

    for network in [Network::Tcp, Network::Udp] {
        let server = Arc::new(Server::listen(network, "127.0.0.1:0", (), noop).await.unwrap());
        let serve = common::spawn_serve(&server);

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(server.close());

        let result = tokio::time::timeout(Duration::from_secs(1), serve)
            .await
            .expect("serve should return within a second of close")
            .unwrap();
        assert!(matches!(result, Err(Error::Closed)), "{network}: {result:?}");
    }
}

#[tokio::test]
async fn close_is_idempotent() {
    let server = Server::listen(Network::Tcp, "127.0.0.1:0", (), noop).await.unwrap();

    assert!(server.close());
    assert!(!server.close());
    assert!(!server.close());
    assert!(server.is_closed());
    assert!(server.serve().await.unwrap_err().is_closed());
}

#[tokio::test]
async fn close_releases_the_port() {
    common::init_tracing();

    let server = Arc::new(Server::listen(Network::Tcp, "127.0.0.1:0", (), noop).await.unwrap());
    let addr = server.local_addr();
    let serve = common::spawn_serve(&server);

    assert!(!common::port_is_free(addr));
    server.close();
    serve.await.unwrap().unwrap_err();

    assert!(common::port_is_free(addr));
}

#[tokio::test]
async fn unsupported_transport_allocates_nothing() {
    let probe = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = probe.local_addr().unwrap();
    drop(probe);

    let err = fanout::listen("sctp", &addr.to_string(), (), noop).await.unwrap_err();
    assert!(matches!(err, Error::UnsupportedTransport(ref name) if name == "sctp"));
    assert!(err.is_config());

    assert!(common::port_is_free(addr));
}

#[tokio::test]
async fn bind_failure_passes_through() {
    let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = taken.local_addr().unwrap().to_string();

    match fanout::listen("tcp", &addr, (), noop).await.unwrap_err() {
        Error::Io(e) => assert_eq!(e.kind(), io::ErrorKind::AddrInUse),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn max_in_flight_limits_running_handlers() {
    common::init_tracing();

    let config = parse_config("max_in_flight = 1\n").unwrap();
    let started = Arc::new(AtomicUsize::new(0));
    let (release, gate) = watch::channel(false);

    let server = Arc::new(
        Server::listen_with_config(
            Network::Tcp,
            "127.0.0.1:0",
            (),
            {
                let started = Arc::clone(&started);
                move |inbound: Inbound<()>| {
                    let started = Arc::clone(&started);
                    let mut gate = gate.clone();
                    async move {
                        started.fetch_add(1, Ordering::SeqCst);
                        let _ = gate.wait_for(|open| *open).await;
                        drop(inbound);
                    }
                }
            },
            config,
        )
        .await
        .unwrap(),
    );
    let serve = common::spawn_serve(&server);

    let _first = TcpStream::connect(server.local_addr()).await.unwrap();
    let _second = TcpStream::connect(server.local_addr()).await.unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(started.load(Ordering::SeqCst), 1);
    assert_eq!(server.in_flight(), 1);

    release.send_replace(true);
    tokio::time::timeout(WAIT, async {
        while started.load(Ordering::SeqCst) < 2 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("second handler admitted after the first finished");

    tokio::time::timeout(WAIT, server.wait_idle()).await.expect("drained");

    server.close();
    assert!(serve.await.unwrap().unwrap_err().is_closed());
}

#[tokio::test]
async fn invalid_config_is_rejected() {
    let err = parse_config("max_in_flight = 0\n").unwrap_err();
    let err = Error::from(err);
    assert!(err.is_config());
}
