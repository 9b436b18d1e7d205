use super::buffer::{DelimiterSet, TokenBuffer};
use super::chunk::Chunk;
use super::detector::ToolCallDetector;
use super::format::{Passthrough, PostProcessor};
use crate::config::{ModelEntry, PipelineConfig};
use crate::error::ChatError;
use crate::observability::{NoopObserver, Observer, ObserverEvent, record};
use crate::providers::{ChatModel, Conversation, GenerationParams, PromptOptions, build_prompt};
use crate::tools::ToolRegistry;
use futures_util::{Stream, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Cleaned chunks for one response. Only the terminal chunk has `last` set.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<Chunk, ChatError>> + Send>>;

/// Buffering, post-processing and tool detection for one response.
pub struct ChunkPipeline {
    buffer: TokenBuffer,
    post: Arc<dyn PostProcessor>,
    detector: ToolCallDetector,
}

impl ChunkPipeline {
    pub fn new(buffer: TokenBuffer, post: Arc<dyn PostProcessor>, detector: ToolCallDetector) -> Self {
        Self {
            buffer,
            post,
            detector,
        }
    }

    pub async fn push(&mut self, raw: &str) -> Vec<Chunk> {
        let mut out = Vec::new();
        for chunk in self.buffer.consume(raw) {
            let chunk = self.post.process(chunk);
            if !chunk.text.is_empty() {
                out.extend(self.detector.push(chunk).await);
            }
        }
        out
    }

    pub async fn finish(&mut self) -> Vec<Chunk> {
        let mut out = Vec::new();
        if let Some(chunk) = self.buffer.flush() {
            let chunk = self.post.process(chunk);
            if !chunk.text.is_empty() {
                out.extend(self.detector.push(chunk).await);
            }
        }
        out.extend(self.detector.finish().await);
        out
    }
}

/// Holds back one chunk so the terminal chunk can be flagged `last`.
struct Emitter {
    observer: Arc<dyn Observer>,
    pending: Option<Chunk>,
    emitted: usize,
}

impl Emitter {
    fn new(observer: Arc<dyn Observer>) -> Self {
        Self {
            observer,
            pending: None,
            emitted: 0,
        }
    }

    fn accept(&mut self, chunk: Chunk) -> Chunk {
        self.emitted += 1;
        record(
            self.observer.as_ref(),
            &ObserverEvent::ChunkAccepted {
                chunk: chunk.clone(),
            },
        );
        chunk
    }

    fn offer(&mut self, chunk: Chunk) -> Option<Chunk> {
        self.pending.replace(chunk).map(|prev| self.accept(prev))
    }

    /// Release the held chunk without marking it terminal.
    fn release(&mut self) -> Option<Chunk> {
        self.pending.take().map(|chunk| self.accept(chunk))
    }

    fn finish(&mut self) -> Option<Chunk> {
        self.pending
            .take()
            .map(|chunk| self.accept(chunk.into_last()))
    }
}

/// Turns a conversation into a stream of cleaned chunks from one model.
pub struct ChatAdapter {
    model: Arc<dyn ChatModel>,
    observer: Arc<dyn Observer>,
    post: Arc<dyn PostProcessor>,
    prompt: PromptOptions,
    params: GenerationParams,
    chunk_threshold: usize,
    scan_window: usize,
}

impl ChatAdapter {
    pub fn new(model: Arc<dyn ChatModel>, entry: &ModelEntry, pipeline: &PipelineConfig) -> Self {
        Self {
            model,
            observer: Arc::new(NoopObserver),
            post: Arc::new(Passthrough),
            prompt: PromptOptions {
                model_id: entry.id.clone(),
                history_window: pipeline.history_window,
                template: entry.prompt_template.clone(),
            },
            params: GenerationParams::from_entry(entry),
            chunk_threshold: pipeline.chunk_threshold,
            scan_window: pipeline.tool_scan_window,
        }
    }

    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = observer;
        self
    }

    #[must_use]
    pub fn with_post_processor(mut self, post: Arc<dyn PostProcessor>) -> Self {
        self.post = post;
        self
    }

    pub fn params(&self) -> &GenerationParams {
        &self.params
    }

    fn pipeline(&self, tools: Arc<ToolRegistry>) -> ChunkPipeline {
        ChunkPipeline::new(
            TokenBuffer::new(DelimiterSet::new(&self.params.stop), self.chunk_threshold),
            Arc::clone(&self.post),
            ToolCallDetector::new(tools, Arc::clone(&self.observer), self.scan_window),
        )
    }

    fn start(&self, conversation: &Conversation, tools: &ToolRegistry) -> Result<String, ChatError> {
        let prompt = build_prompt(conversation, &tools.specs(), &self.prompt)?;
        record(
            self.observer.as_ref(),
            &ObserverEvent::ChatStart {
                model: self.prompt.model_id.clone(),
                tools: tools.len(),
            },
        );
        tracing::debug!(
            model = %self.prompt.model_id,
            prompt_chars = prompt.chars().count(),
            "Built prompt"
        );
        Ok(prompt)
    }

    fn record_failure(&self, error: &ChatError) {
        record(
            self.observer.as_ref(),
            &ObserverEvent::Error {
                component: self.model.name().to_string(),
                message: error.to_string(),
            },
        );
    }

    /// Streaming generation.
    ///
    /// Errors before the first byte are returned directly; later failures are
    /// the final stream item. When `cancel` fires no further chunks are
    /// produced.
    pub async fn generate(
        &self,
        conversation: &Conversation,
        tools: Arc<ToolRegistry>,
        cancel: CancellationToken,
    ) -> Result<ChunkStream, ChatError> {
        let prompt = self.start(conversation, &tools)?;
        let started = Instant::now();

        let mut raw = self
            .model
            .stream_raw(&prompt, &self.params, cancel.clone())
            .await
            .inspect_err(|error| self.record_failure(error))?;

        let mut pipeline = self.pipeline(tools);
        let observer = Arc::clone(&self.observer);
        let component = self.model.name().to_string();

        let stream = async_stream::stream! {
            let mut emitter = Emitter::new(Arc::clone(&observer));
            let mut failure = None;

            loop {
                let next = tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    next = raw.next() => next,
                };
                match next {
                    None => break,
                    Some(Ok(text)) => {
                        for chunk in pipeline.push(&text).await {
                            if let Some(ready) = emitter.offer(chunk) {
                                yield Ok(ready);
                            }
                        }
                    }
                    Some(Err(error)) => {
                        failure = Some(error);
                        break;
                    }
                }
            }

            let cancelled = cancel.is_cancelled();
            if !cancelled {
                for chunk in pipeline.finish().await {
                    if let Some(ready) = emitter.offer(chunk) {
                        yield Ok(ready);
                    }
                }
            }

            match failure {
                Some(error) => {
                    if let Some(ready) = emitter.release() {
                        yield Ok(ready);
                    }
                    record(
                        observer.as_ref(),
                        &ObserverEvent::Error {
                            component: component.clone(),
                            message: error.to_string(),
                        },
                    );
                    record(
                        observer.as_ref(),
                        &ObserverEvent::ChatEnd {
                            duration: started.elapsed(),
                            chunks: emitter.emitted,
                            cancelled: false,
                        },
                    );
                    yield Err(error);
                }
                None => {
                    if !cancelled {
                        if let Some(last) = emitter.finish() {
                            yield Ok(last);
                        }
                    }
                    record(
                        observer.as_ref(),
                        &ObserverEvent::ChatEnd {
                            duration: started.elapsed(),
                            chunks: emitter.emitted,
                            cancelled,
                        },
                    );
                }
            }
        };

        Ok(Box::pin(stream))
    }

    /// Single-shot generation: the whole completion run through the same
    /// pipeline.
    pub async fn generate_once(
        &self,
        conversation: &Conversation,
        tools: Arc<ToolRegistry>,
    ) -> Result<Vec<Chunk>, ChatError> {
        let prompt = self.start(conversation, &tools)?;
        let started = Instant::now();

        let text = self
            .model
            .complete(&prompt, &self.params)
            .await
            .inspect_err(|error| self.record_failure(error))?;

        let mut pipeline = self.pipeline(tools);
        let mut emitter = Emitter::new(Arc::clone(&self.observer));
        let mut chunks = Vec::new();
        let produced = {
            let mut produced = pipeline.push(&text).await;
            produced.extend(pipeline.finish().await);
            produced
        };
        for chunk in produced {
            chunks.extend(emitter.offer(chunk));
        }
        chunks.extend(emitter.finish());

        record(
            self.observer.as_ref(),
            &ObserverEvent::ChatEnd {
                duration: started.elapsed(),
                chunks: chunks.len(),
                cancelled: false,
            },
        );
        Ok(chunks)
    }
}
