use weaver_input::{BatchId, ChangeBuffer, TypingBuffer};

/// A call made on the change buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferCall {
    Input(usize),
    Lock,
    Unlock,
    SelectionChanged,
    DocumentChanged(BatchId),
}

/// `TypingBuffer` that records every call except `batch`.
#[derive(Debug, Clone, Default)]
pub struct LoggingBuffer {
    inner: TypingBuffer,
    calls: Vec<BufferCall>,
}

impl LoggingBuffer {
    pub fn new(limit: usize) -> Self {
        Self {
            inner: TypingBuffer::new(limit),
            calls: Vec::new(),
        }
    }

    pub fn calls(&self) -> &[BufferCall] {
        &self.calls
    }

    pub fn count(&self, call: BufferCall) -> usize {
        self.calls.iter().filter(|c| **c == call).count()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl ChangeBuffer for LoggingBuffer {
    fn batch(&mut self) -> BatchId {
        self.inner.batch()
    }

    fn input(&mut self, chars: usize) {
        self.calls.push(BufferCall::Input(chars));
        self.inner.input(chars);
    }

    fn lock(&mut self) {
        self.calls.push(BufferCall::Lock);
        self.inner.lock();
    }

    fn unlock(&mut self) {
        self.calls.push(BufferCall::Unlock);
        self.inner.unlock();
    }

    fn is_locked(&self) -> bool {
        self.inner.is_locked()
    }

    fn selection_changed(&mut self) {
        self.calls.push(BufferCall::SelectionChanged);
        self.inner.selection_changed();
    }

    fn document_changed(&mut self, batch: BatchId) {
        self.calls.push(BufferCall::DocumentChanged(batch));
        self.inner.document_changed(batch);
    }
}
