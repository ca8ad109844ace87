use {super::*, zeromq::{Socket, SocketRecv, SubSocket}};

/// One `hashblock` notification as it arrives off the wire.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct HashBlock {
    pub(crate) block_hash: String,
    pub(crate) counter: u32,
}

pub(crate) struct Zmq {
    socket: SubSocket,
    endpoint: String,
}

impl Zmq {
    pub(crate) async fn connect(endpoint: &str) -> Result<Self> {
        info!("Subscribing to hashblock on ZMQ endpoint {endpoint}");

        let socket = timeout(Duration::from_secs(1), async {
            let mut socket = SubSocket::new();
            socket.connect(endpoint).await?;
            socket.subscribe("hashblock").await?;

            Ok::<_, Error>(socket)
        })
        .await
        .with_context(|| format!("timed out connecting to {endpoint}"))??;

        Ok(Self {
            socket,
            endpoint: endpoint.to_string(),
        })
    }

    /// Receive the next notification. Frames are
    /// `["hashblock", block_hash_bytes, counter_u32_le]`.
    pub(crate) async fn recv_hashblock(&mut self) -> Result<HashBlock> {
        let message = self.socket.recv().await?;

        ensure!(
            message.len() == 3,
            "hashblock: expected 3 frames, got {}",
            message.len()
        );

        let topic = message.get(0).context("hashblock: missing topic")?;
        ensure!(topic.as_ref() == b"hashblock", "hashblock: wrong topic");

        let body = message.get(1).context("hashblock: missing body")?;
        ensure!(body.len() == 32, "hashblock: body len {}", body.len());

        let counter = message.get(2).context("hashblock: missing counter")?;
        ensure!(
            counter.len() == 4,
            "hashblock: counter len {}",
            counter.len()
        );

        let mut hash = [0u8; 32];
        hash.copy_from_slice(body);
        hash.reverse();

        let mut counter_bytes = [0u8; 4];
        counter_bytes.copy_from_slice(counter);

        Ok(HashBlock {
            block_hash: hex::encode(hash),
            counter: u32::from_le_bytes(counter_bytes),
        })
    }

    pub(crate) fn endpoint(&self) -> &str {
        &self.endpoint
    }
}
