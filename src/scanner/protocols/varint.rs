//! The variable-length integers used for framing in the Java protocol.

/// An `i32` never takes more than 5 bytes.
pub const MAX_VARINT_LEN: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum VarIntError {
    #[error("varint is longer than {MAX_VARINT_LEN} bytes")]
    TooLong,
    #[error("buffer ended in the middle of a varint")]
    Incomplete,
}

pub fn write_varint(writer: &mut Vec<u8>, value: i32) {
    // negative numbers are written as their two's complement bits, so -1 is 5
    // bytes long
    let mut value = value as u32;
    loop {
        let byte = (value & 0b0111_1111) as u8;
        value >>= 7;
        if value == 0 {
            writer.push(byte);
            return;
        }
        writer.push(byte | 0b1000_0000);
    }
}

pub fn encode_varint(value: i32) -> Vec<u8> {
    let mut buffer = Vec::with_capacity(MAX_VARINT_LEN);
    write_varint(&mut buffer, value);
    buffer
}

/// Read a varint from the start of the buffer, returning the value and the
/// number of bytes it took up.
pub fn read_varint(buffer: &[u8]) -> Result<(i32, usize), VarIntError> {
    let mut ans: u32 = 0;
    for i in 0..MAX_VARINT_LEN {
        let Some(&byte) = buffer.get(i) else {
            return Err(VarIntError::Incomplete);
        };
        ans |= ((byte & 0b0111_1111) as u32) << (7 * i);
        if byte & 0b1000_0000 == 0 {
            return Ok((ans as i32, i + 1));
        }
    }
    Err(VarIntError::TooLong)
}
