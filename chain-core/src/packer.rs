//! Tooling for packing and unpacking the chain objects from and to
//! their binary representation.
//!
//! All the multi-byte integers are written big-endian so the binary
//! representation sorts the same way the values do (the height index
//! of the storage relies on this).

use std::io::{BufRead, Read, Write};

/// Codec over any reader or writer, providing the primitive accessors
/// the chain objects are built from.
pub struct Codec<I>(I);

impl<I> Codec<I> {
    pub fn new(inner: I) -> Self {
        Codec(inner)
    }

    pub fn into_inner(self) -> I {
        self.0
    }
}

impl<I> From<I> for Codec<I> {
    fn from(inner: I) -> Self {
        Codec(inner)
    }
}

impl<R: Read> Codec<R> {
    pub fn get_u8(&mut self) -> std::io::Result<u8> {
        let mut buf = [0u8; 1];
        self.0.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    pub fn get_u16(&mut self) -> std::io::Result<u16> {
        let mut buf = [0u8; 2];
        self.0.read_exact(&mut buf)?;
        Ok(u16::from_be_bytes(buf))
    }

    pub fn get_u32(&mut self) -> std::io::Result<u32> {
        let mut buf = [0u8; 4];
        self.0.read_exact(&mut buf)?;
        Ok(u32::from_be_bytes(buf))
    }

    pub fn get_u64(&mut self) -> std::io::Result<u64> {
        let mut buf = [0u8; 8];
        self.0.read_exact(&mut buf)?;
        Ok(u64::from_be_bytes(buf))
    }

    pub fn get_bytes(&mut self, n: usize) -> std::io::Result<Vec<u8>> {
        let mut buf = vec![0u8; n];
        self.0.read_exact(&mut buf)?;
        Ok(buf)
    }
}

impl<W: Write> Codec<W> {
    pub fn put_u8(&mut self, v: u8) -> std::io::Result<()> {
        self.0.write_all(&[v])
    }

    pub fn put_u16(&mut self, v: u16) -> std::io::Result<()> {
        self.0.write_all(&v.to_be_bytes())
    }

    pub fn put_u32(&mut self, v: u32) -> std::io::Result<()> {
        self.0.write_all(&v.to_be_bytes())
    }

    pub fn put_u64(&mut self, v: u64) -> std::io::Result<()> {
        self.0.write_all(&v.to_be_bytes())
    }

    pub fn put_bytes(&mut self, v: &[u8]) -> std::io::Result<()> {
        self.0.write_all(v)
    }
}

impl<R: Read> Read for Codec<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.0.read(buf)
    }
}

impl<W: Write> Write for Codec<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.0.flush()
    }
}

impl<R: BufRead> BufRead for Codec<R> {
    fn fill_buf(&mut self) -> std::io::Result<&[u8]> {
        self.0.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        self.0.consume(amt)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn primitives_round_trip() {
        let mut bytes = Vec::new();
        let mut codec = Codec::new(&mut bytes);
        codec.put_u8(0xab).unwrap();
        codec.put_u16(0xcafe).unwrap();
        codec.put_u32(0xdead_beef).unwrap();
        codec.put_u64(0x0123_4567_89ab_cdef).unwrap();
        codec.put_bytes(b"nidhogg").unwrap();

        let mut codec = Codec::new(Cursor::new(bytes));
        assert_eq!(codec.get_u8().unwrap(), 0xab);
        assert_eq!(codec.get_u16().unwrap(), 0xcafe);
        assert_eq!(codec.get_u32().unwrap(), 0xdead_beef);
        assert_eq!(codec.get_u64().unwrap(), 0x0123_4567_89ab_cdef);
        assert_eq!(codec.get_bytes(7).unwrap(), b"nidhogg");
    }

    #[test]
    fn integers_are_big_endian() {
        let mut bytes = Vec::new();
        Codec::new(&mut bytes).put_u64(1).unwrap();
        assert_eq!(bytes, [0, 0, 0, 0, 0, 0, 0, 1]);
    }

    #[test]
    fn truncated_input_is_an_error() {
        let mut codec = Codec::new(Cursor::new([0u8; 3]));
        assert!(codec.get_u64().is_err());
    }
}
