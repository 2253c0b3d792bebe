//! Asynchronous delivery of tokens from a spawned scan.
//!
//! The producer runs as its own tokio task and hands tokens over by
//! rendezvous: a token is sent only after the consumer has asked for one, so
//! the producer never gets a token ahead of the consumer. It stops when the
//! input is exhausted, when the consumer drops the stream, when
//! [`TokenStream::cancel`] is called, or when the consumer does not ask for the
//! next token within the configured emit timeout.

use std::{
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use futures::Stream;
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};
use tokio_stream::{wrappers::ReceiverStream, StreamExt};
use tracing::{debug, trace, Instrument};
use uuid::Uuid;

use super::{scanner::Scanner, token::Token, LexError, LexResult};
use crate::{compiler::CompiledPatterns, config::LexerConfig};

/// Cursor moves the producer makes before yielding to the runtime.
const STEPS_PER_YIELD: usize = 4096;

/// How a spawned scan ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Every token, including the end-of-stream token, was taken.
    Completed { emitted: usize },
    /// The consumer went away before the scan finished.
    ConsumerDropped { emitted: usize },
}

/// Consumer side of a spawned scan.
pub struct TokenStream {
    id: Uuid,
    receiver: ReceiverStream<LexResult<Token>>,
    demand: mpsc::Sender<()>,
    /// A request is outstanding and its token has not arrived yet.
    requested: bool,
    cancel: Option<oneshot::Sender<()>>,
    handle: JoinHandle<LexResult<ScanOutcome>>,
}

impl TokenStream {
    /// Spawns the producer task. Must be called from within a tokio runtime.
    pub(crate) fn spawn(
        patterns: Arc<CompiledPatterns>,
        config: LexerConfig,
        input: String,
    ) -> Self {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(1);
        let (demand_tx, demand_rx) = mpsc::channel(1);
        let (cancel_tx, cancel_rx) = oneshot::channel();

        let span = tracing::debug_span!("scan", %id, len = input.len());
        let handle = tokio::spawn(
            produce(patterns, config, input, tx, demand_rx, cancel_rx).instrument(span),
        );

        Self {
            id,
            receiver: ReceiverStream::new(rx),
            demand: demand_tx,
            requested: false,
            cancel: Some(cancel_tx),
            handle,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Next token, an error that ended the scan, or `None` once the producer
    /// has finished.
    pub async fn recv(&mut self) -> Option<LexResult<Token>> {
        self.next().await
    }

    /// Asks the producer to stop. Tokens already taken stay valid.
    pub fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            debug!(id = %self.id, "scan cancelled by consumer");
            let _ = cancel.send(());
        }
    }

    /// Drains every token, failing on the first error the producer reports.
    pub async fn collect_tokens(mut self) -> LexResult<Vec<Token>> {
        let mut tokens = Vec::new();
        while let Some(item) = self.recv().await {
            tokens.push(item?);
        }
        self.join().await?;
        Ok(tokens)
    }

    /// Stops reading and waits for the producer to finish.
    ///
    /// A producer still scanning sees the consumer go away and reports
    /// [`ScanOutcome::ConsumerDropped`].
    pub async fn join(self) -> LexResult<ScanOutcome> {
        let Self {
            receiver,
            demand,
            cancel,
            handle,
            ..
        } = self;
        drop(demand);
        drop(receiver);
        let result = handle
            .await
            .map_err(|e| LexError::TaskFailed(e.to_string()))?;
        drop(cancel);
        result
    }

    fn request(&mut self) {
        if !self.requested {
            // Fails only once the producer is gone; the receiver then ends.
            let _ = self.demand.try_send(());
            self.requested = true;
        }
    }
}

impl Stream for TokenStream {
    type Item = LexResult<Token>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.request();
        let polled = Pin::new(&mut self.receiver).poll_next(cx);
        if polled.is_ready() {
            self.requested = false;
        }
        polled
    }
}

impl std::fmt::Debug for TokenStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStream")
            .field("id", &self.id)
            .field("requested", &self.requested)
            .field("cancelled", &self.cancel.is_none())
            .field("finished", &self.handle.is_finished())
            .finish()
    }
}

async fn produce(
    patterns: Arc<CompiledPatterns>,
    config: LexerConfig,
    input: String,
    tx: mpsc::Sender<LexResult<Token>>,
    mut demand: mpsc::Receiver<()>,
    mut cancel: oneshot::Receiver<()>,
) -> LexResult<ScanOutcome> {
    let mut scanner = Scanner::new(&patterns, &input, config.unclosed);
    let mut emitted = 0;

    loop {
        let item = match scanner.poll_steps(STEPS_PER_YIELD) {
            Poll::Ready(Some(item)) => item,
            Poll::Ready(None) => break,
            Poll::Pending => {
                if !matches!(cancel.try_recv(), Err(oneshot::error::TryRecvError::Empty)) {
                    return Err(LexError::Cancelled);
                }
                trace!(pos = scanner.position(), "yielding inside long text");
                tokio::task::yield_now().await;
                continue;
            }
        };

        let asked = match config.emit_timeout {
            Some(limit) => tokio::select! {
                biased;
                _ = &mut cancel => return Err(LexError::Cancelled),
                asked = tokio::time::timeout(limit, demand.recv()) => match asked {
                    Ok(asked) => asked.is_some(),
                    Err(_) => return Err(LexError::EmitTimeout { after: limit }),
                },
            },
            None => tokio::select! {
                biased;
                _ = &mut cancel => return Err(LexError::Cancelled),
                asked = demand.recv() => asked.is_some(),
            },
        };

        let failure = item.as_ref().err().cloned();
        if !asked || tx.send(item).await.is_err() {
            debug!(emitted, "consumer dropped the stream");
            return Ok(ScanOutcome::ConsumerDropped { emitted });
        }
        if let Some(e) = failure {
            return Err(e);
        }
        emitted += 1;
    }

    debug!(emitted, "scan completed");
    Ok(ScanOutcome::Completed { emitted })
}
