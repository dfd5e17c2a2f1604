//! LLM 客户端抽象与实现（OpenAI 兼容 / Mock）

pub mod mock;
pub mod openai;
pub mod traits;

pub use mock::MockClient;
pub use openai::OpenAiClient;
pub use traits::{ChatClient, ChunkStream, StreamChunk, ToolCallRequest, ToolSchema};

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::Stream;
use tokio::sync::mpsc;

/// 将 mpsc 接收端适配为 Stream（分片随到随出，发送端 drop 即流结束）
pub(crate) struct ReceiverStream<T> {
    rx: mpsc::UnboundedReceiver<T>,
}

impl<T> ReceiverStream<T> {
    pub(crate) fn new(rx: mpsc::UnboundedReceiver<T>) -> Self {
        Self { rx }
    }
}

impl<T> Stream for ReceiverStream<T> {
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        self.get_mut().rx.poll_recv(cx)
    }
}
