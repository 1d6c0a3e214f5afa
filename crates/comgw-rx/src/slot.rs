//! Deferred PDU storage

/// Payload buffer of one deferred PDU.
///
/// The stored length is kept as `len + 1` so that a received zero-length PDU
/// is distinguishable from "nothing stored".
#[derive(Debug, Clone)]
pub struct DeferredPduSlot {
    stored: usize,
    data: Box<[u8]>,
}

impl DeferredPduSlot {
    pub fn new(length: usize) -> Self {
        Self {
            stored: 0,
            data: vec![0; length].into_boxed_slice(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn is_stored(&self) -> bool {
        self.stored != 0
    }

    /// Stored payload length, if any
    pub fn stored_len(&self) -> Option<usize> {
        self.stored.checked_sub(1)
    }

    /// Copy `payload` in, truncated to the slot capacity.
    ///
    /// Returns whether a payload was already stored (and is now overwritten).
    pub fn store(&mut self, payload: &[u8]) -> bool {
        let was_stored = self.is_stored();
        let len = payload.len().min(self.data.len());
        self.data[..len].copy_from_slice(&payload[..len]);
        self.stored = len + 1;
        was_stored
    }

    /// Move the stored payload into `out` and mark the slot empty
    pub fn take_into(&mut self, out: &mut Vec<u8>) -> bool {
        let Some(len) = self.stored_len() else {
            return false;
        };
        out.clear();
        out.extend_from_slice(&self.data[..len]);
        self.stored = 0;
        true
    }

    pub fn clear(&mut self) {
        self.stored = 0;
    }
}
