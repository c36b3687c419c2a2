use async_trait::async_trait;
use geo_runtime_models::{ErrorShape, InvocationRequest, InvocationResponse, RuntimeError};
use tokio::sync::mpsc;

/// The platform channel the dispatcher pulls invocations from and answers through.
#[async_trait]
pub trait Transport: Send {
    /// Waits for the next invocation. `Ok(None)` means the platform closed the stream.
    async fn next_invocation(&mut self) -> Result<Option<InvocationRequest>, RuntimeError>;

    async fn send_response(
        &mut self,
        request_id: &str,
        response: &InvocationResponse,
    ) -> Result<(), RuntimeError>;

    /// Reports a startup failure before any invocation is served.
    async fn report_init_error(&mut self, error: &ErrorShape) -> Result<(), RuntimeError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChannelMessage {
    Response {
        request_id: String,
        response: InvocationResponse,
    },
    InitError(ErrorShape),
}

/// In-process transport backed by tokio channels.
pub struct ChannelTransport {
    requests: mpsc::Receiver<InvocationRequest>,
    outbound: mpsc::UnboundedSender<ChannelMessage>,
}

/// The platform side of a [`ChannelTransport`].
pub struct ChannelClient {
    requests: Option<mpsc::Sender<InvocationRequest>>,
    outbound: mpsc::UnboundedReceiver<ChannelMessage>,
}

pub fn channel(capacity: usize) -> (ChannelTransport, ChannelClient) {
    let (req_tx, req_rx) = mpsc::channel(capacity);
    let (out_tx, out_rx) = mpsc::unbounded_channel();
    (
        ChannelTransport {
            requests: req_rx,
            outbound: out_tx,
        },
        ChannelClient {
            requests: Some(req_tx),
            outbound: out_rx,
        },
    )
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn next_invocation(&mut self) -> Result<Option<InvocationRequest>, RuntimeError> {
        Ok(self.requests.recv().await)
    }

    async fn send_response(
        &mut self,
        request_id: &str,
        response: &InvocationResponse,
    ) -> Result<(), RuntimeError> {
        self.outbound
            .send(ChannelMessage::Response {
                request_id: request_id.to_string(),
                response: response.clone(),
            })
            .map_err(|_| RuntimeError::transport("response channel closed"))
    }

    async fn report_init_error(&mut self, error: &ErrorShape) -> Result<(), RuntimeError> {
        self.outbound
            .send(ChannelMessage::InitError(error.clone()))
            .map_err(|_| RuntimeError::transport("response channel closed"))
    }
}

impl ChannelClient {
    pub async fn send(&self, request: InvocationRequest) -> Result<(), RuntimeError> {
        let sender = self
            .requests
            .as_ref()
            .ok_or_else(|| RuntimeError::transport("request channel closed"))?;
        sender
            .send(request)
            .await
            .map_err(|_| RuntimeError::transport("runtime stopped receiving"))
    }

    pub async fn recv(&mut self) -> Option<ChannelMessage> {
        self.outbound.recv().await
    }

    /// Sends one request and waits for its response.
    pub async fn invoke(&mut self, request: InvocationRequest) -> Result<InvocationResponse, RuntimeError> {
        let request_id = request.context.request_id.clone();
        self.send(request).await?;
        while let Some(message) = self.recv().await {
            if let ChannelMessage::Response {
                request_id: id,
                response,
            } = message
            {
                if id == request_id {
                    return Ok(response);
                }
            }
        }
        Err(RuntimeError::transport("runtime exited before responding"))
    }

    /// Ends the invocation stream; the runtime stops once it is idle.
    pub fn close(&mut self) {
        self.requests = None;
    }
}
