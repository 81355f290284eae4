use anyhow::anyhow;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use bytes_varint::{VarIntSupport, VarIntSupportMut};


pub fn put_bytes(buf: &mut BytesMut, bytes: &[u8]) {
    buf.put_usize_varint(bytes.len());
    buf.put_slice(bytes);
}

pub fn try_get_bytes(buf: &mut impl Buf) -> anyhow::Result<Bytes> {
    let len = buf.try_get_usize_varint()?;
    if buf.remaining() < len {
        return Err(anyhow!("length prefix {} exceeds remaining buffer of {} bytes", len, buf.remaining()));
    }
    Ok(buf.copy_to_bytes(len))
}

#[cfg(test)]
mod test {
    use rstest::rstest;
    use super::*;

    #[rstest]
    #[case::empty(b"")]
    #[case::single(b"x")]
    #[case::longer(b"some payload bytes")]
    fn test_bytes_round_trip(#[case] payload: &[u8]) {
        let mut buf = BytesMut::new();
        put_bytes(&mut buf, payload);

        let mut buf = buf.freeze();
        assert_eq!(try_get_bytes(&mut buf).unwrap(), Bytes::copy_from_slice(payload));
        assert!(!buf.has_remaining());
    }

    #[test]
    fn test_get_bytes_underflow() {
        let mut buf = BytesMut::new();
        buf.put_usize_varint(17);
        buf.put_slice(b"too short");

        assert!(try_get_bytes(&mut buf.freeze()).is_err());
    }
}
