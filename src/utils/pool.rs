use parking_lot::Mutex;

/// Reuse pool for serialization buffers, bounding allocation churn under
/// sustained publish throughput. Returned buffers keep their capacity and
/// are cleared on checkout.
pub struct BufferPool {
    buffers: Mutex<Vec<Vec<u8>>>,
    max_pooled: usize,
}

impl BufferPool {
    pub fn new(max_pooled: usize) -> Self {
        Self {
            buffers: Mutex::new(Vec::new()),
            max_pooled,
        }
    }

    pub fn get(&self) -> Vec<u8> {
        match self.buffers.lock().pop() {
            Some(mut buf) => {
                buf.clear();
                buf
            }
            None => Vec::new(),
        }
    }

    pub fn put(
        &self,
        buf: Vec<u8>,
    ) {
        let mut buffers = self.buffers.lock();
        if buffers.len() < self.max_pooled {
            buffers.push(buf);
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.buffers.lock().len()
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new(64)
    }
}
