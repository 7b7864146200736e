//! MSB-first bit packing for Golomb-Rice streams.

/// Accumulates bits most-significant first.
#[derive(Debug, Default)]
pub struct BitWriter {
    data: Vec<u8>,
    current: u8,
    used: u8,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_bit(&mut self, bit: bool) {
        if bit {
            self.current |= 1u8 << (7 - self.used);
        }
        self.used += 1;
        if self.used == 8 {
            self.data.push(self.current);
            self.current = 0;
            self.used = 0;
        }
    }

    /// Write the low `count` bits of `value`, high bit first.
    pub fn write_bits(&mut self, value: u64, count: u8) {
        for i in (0..count).rev() {
            self.write_bit((value >> i) & 1 == 1);
        }
    }

    /// Flush the partial byte (zero padded) and return the stream.
    pub fn finish(mut self) -> Vec<u8> {
        if self.used > 0 {
            self.data.push(self.current);
        }
        self.data
    }
}

/// Reads bits most-significant first; never indexes past the buffer.
#[derive(Debug)]
pub struct BitReader<'a> {
    data: &'a [u8],
    bit_pos: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, bit_pos: 0 }
    }

    pub fn bits_remaining(&self) -> usize {
        self.data.len() * 8 - self.bit_pos
    }

    pub fn read_bit(&mut self) -> Option<bool> {
        let byte = *self.data.get(self.bit_pos / 8)?;
        let bit = (byte >> (7 - (self.bit_pos % 8))) & 1 == 1;
        self.bit_pos += 1;
        Some(bit)
    }

    /// Read `count` bits (at most 64) as an unsigned integer.
    pub fn read_bits(&mut self, count: u8) -> Option<u64> {
        if count > 64 || usize::from(count) > self.bits_remaining() {
            return None;
        }
        let mut value = 0u64;
        for _ in 0..count {
            let bit = self.read_bit()?;
            value = (value << 1) | u64::from(bit);
        }
        Some(value)
    }

    /// Count 1-bits up to the terminating 0-bit.
    pub fn read_unary(&mut self) -> Option<u64> {
        let mut count = 0u64;
        loop {
            if !self.read_bit()? {
                return Some(count);
            }
            count += 1;
        }
    }
}
