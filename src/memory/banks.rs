/// Arena of equally sized memory banks, addressed by bank index and offset.
#[derive(Debug, Clone)]
pub struct Banks {
    data: Vec<u8>,
    bank_size: usize,
    count: usize,
}

impl Banks {
    pub fn new(count: usize, bank_size: usize) -> Banks {
        Banks {
            data: vec![0; count * bank_size],
            bank_size,
            count,
        }
    }

    /// Splits `image` into banks, padding a short image with `fill`.
    pub fn from_image(mut image: Vec<u8>, count: usize, bank_size: usize, fill: u8) -> Banks {
        image.resize(count * bank_size, fill);
        Banks {
            data: image,
            bank_size,
            count,
        }
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn bank(&self, index: usize) -> &[u8] {
        let start = index * self.bank_size;
        &self.data[start..start + self.bank_size]
    }

    #[inline]
    pub fn read(&self, bank: usize, offset: usize) -> u8 {
        self.data[bank * self.bank_size + (offset % self.bank_size)]
    }

    #[inline]
    pub fn write(&mut self, bank: usize, offset: usize, data: u8) {
        self.data[bank * self.bank_size + (offset % self.bank_size)] = data;
    }

    /// Bank-number mask for power-of-two bank counts.
    #[inline]
    pub fn mask(&self) -> usize {
        self.count.saturating_sub(1)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Replaces the whole arena. The caller guarantees `bytes.len() == self.len()`.
    pub fn copy_from(&mut self, bytes: &[u8]) {
        self.data.copy_from_slice(bytes);
    }
}
