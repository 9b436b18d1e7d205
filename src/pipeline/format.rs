use super::chunk::Chunk;

/// Cosmetic rewrite applied to each buffered text chunk before tool
/// detection. Tool-result chunks never pass through here.
pub trait PostProcessor: Send + Sync {
    fn process(&self, chunk: Chunk) -> Chunk;
}

/// Leaves text untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl PostProcessor for Passthrough {
    fn process(&self, chunk: Chunk) -> Chunk {
        chunk
    }
}
