use clap::Parser as _;
use lidar_topdown::{Args, RasterSurface, Session, Transport};
use std::{error::Error, time::Duration};
use zenoh::{Wait, handlers::FifoChannelHandler, pubsub::Subscriber, sample::Sample};

/// Subscription construction on a live zenoh session. Key expressions are
/// untyped, so the schema candidate only matters to bridges that validate
/// it; a construction failure still advances the candidate walk.
struct ZenohTransport<'a> {
    session: &'a zenoh::Session,
    subscriber: Option<Subscriber<FifoChannelHandler<Sample>>>,
}

impl Transport for ZenohTransport<'_> {
    type Error = zenoh::Error;

    fn subscribe(&mut self, topic: &str, _message_type: &str) -> Result<(), zenoh::Error> {
        let sub = self.session.declare_subscriber(topic).wait()?;
        self.subscriber = Some(sub);
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    #[cfg(feature = "rerun")]
    let (rr, _serve_guard) = args.rerun.init("lidar-topdown")?;

    let mut surface = RasterSurface::new(args.width, args.height);
    let mut session = Session::new(
        args.max_points,
        args.max_range,
        Duration::from_millis(args.reconnect_ms),
    )
    .with_topic(args.topic.clone());

    session.connect_started();
    loop {
        let z = match zenoh::open(args.clone()).await {
            Ok(z) => z,
            Err(e) => {
                eprintln!("Failed to open zenoh session: {e}");
                session.connection_error();
                println!("lidar: {}", session.status());
                wait_for_reconnect(&mut session).await;
                continue;
            }
        };

        let mut transport = ZenohTransport { session: &z, subscriber: None };
        session.connection_established(&mut transport);
        println!("lidar: {}", session.status());

        let Some(sub) = transport.subscriber.take() else {
            // No schema candidate could be constructed; retry the whole
            // connect/subscribe cycle after the usual delay.
            let _ = z.close().await;
            wait_for_reconnect(&mut session).await;
            continue;
        };

        while let Ok(msg) = sub.recv_async().await {
            if session
                .handle_message(&msg.payload().to_bytes(), &mut surface)
                .is_some()
            {
                #[cfg(feature = "rerun")]
                {
                    let image = rerun::Image::from_l8(
                        surface.data().to_vec(),
                        [surface.width() as u32, surface.height() as u32],
                    );
                    if let Err(e) = rr.log("lidar/topdown", &image) {
                        eprintln!("Failed to log top-down frame: {e:?}");
                    }
                }
            }
            println!("lidar: {}", session.status());
        }

        // Receive channel closed: the transport went away, gracefully or not.
        wait_for_reconnect(&mut session).await;
    }
}

/// Schedule the single reconnect for a closed transport and sleep it out.
/// The epoch token keeps a superseded timer from dialing twice.
async fn wait_for_reconnect(session: &mut Session) {
    let token = session.connection_closed();
    println!("lidar: {}", session.status());
    tokio::time::sleep(token.delay).await;
    // This driver owns the session, so the token is never superseded.
    let again = session.reconnect_due(token);
    debug_assert!(again);
}
