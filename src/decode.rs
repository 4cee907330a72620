//! The binary decoder: turns a SPIR-V byte buffer into an
//! ordered [`Instruction`] vector plus the module [`Header`].

use crate::error::Error;
use num_traits::FromPrimitive;
use spirv::Op;

const MAGIC_NUMBER: u32 = 0x0723_0203;

/// The module header: magic, version, generator, id bound, schema.
///
/// Consumed by [`decode`] but not forwarded into the translator proper —
/// nothing downstream of the decoder looks at it — it is returned here
/// mainly so a caller can log or assert on it before translation begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub version: u32,
    pub generator: u32,
    pub bound: u32,
    pub schema: u32,
}

/// A single decoded SPIR-V instruction.
#[derive(Debug, Clone)]
pub struct Instruction {
    pub opcode: Op,
    pub operand_count: u16,
    pub operands: Vec<u32>,
    /// The inline UTF-8 payload carried by ops like `OpName`, `OpString`,
    /// `OpMemberName`, `OpSource`, and `OpEntryPoint`.
    pub string: Option<String>,
    /// Word count of the instruction, header word included.
    pub length: u16,
}

impl Instruction {
    pub fn operand(&self, index: usize) -> Result<u32, Error> {
        self.operands
            .get(index)
            .copied()
            .ok_or_else(|| Error::MalformedModule(format!("{:?} is missing operand {}", self.opcode, index)))
    }
}

fn carries_string(op: Op) -> Option<usize> {
    // Index (into `operands`) of the first word of the string literal, for
    // every opcode the translator needs the payload of.
    match op {
        Op::Name => Some(1),
        Op::MemberName => Some(2),
        Op::String => Some(1),
        Op::Source => Some(3),
        Op::SourceExtension => Some(0),
        Op::ExtInstImport => Some(1),
        Op::EntryPoint => Some(2),
        _ => None,
    }
}

fn decode_string(words: &[u32]) -> String {
    let mut bytes = Vec::with_capacity(words.len() * 4);
    'outer: for &word in words {
        for shift in [0u32, 8, 16, 24] {
            let byte = ((word >> shift) & 0xff) as u8;
            if byte == 0 {
                break 'outer;
            }
            bytes.push(byte);
        }
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Decodes a SPIR-V byte buffer into its header and instruction stream.
///
/// Byte order is little-endian by convention; if the magic number is found
/// byte-swapped, every word in the stream is swapped before decoding
/// continues (SPIR-V producers on big-endian hosts emit the stream this
/// way).
pub fn decode(bytes: &[u8]) -> Result<(Header, Vec<Instruction>), Error> {
    if bytes.len() < 20 || bytes.len() % 4 != 0 {
        return Err(Error::MalformedModule(format!(
            "buffer length {} is not a valid word-aligned SPIR-V stream",
            bytes.len()
        )));
    }

    let mut words: Vec<u32> = bytes
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();

    if words[0] != MAGIC_NUMBER {
        if words[0] == MAGIC_NUMBER.swap_bytes() {
            for word in &mut words {
                *word = word.swap_bytes();
            }
        } else {
            return Err(Error::MalformedModule(format!(
                "bad magic number 0x{:08x}",
                words[0]
            )));
        }
    }

    let header = Header {
        version: words[1],
        generator: words[2],
        bound: words[3],
        schema: words[4],
    };

    let mut instructions = Vec::new();
    let mut cursor = 5usize;
    while cursor < words.len() {
        let header_word = words[cursor];
        let length = (header_word >> 16) as u16;
        let raw_opcode = (header_word & 0xffff) as u16;
        if length == 0 {
            return Err(Error::MalformedModule(
                "instruction with zero word count".into(),
            ));
        }
        if cursor + length as usize > words.len() {
            return Err(Error::MalformedModule(format!(
                "instruction at word {} declares length {} past end of buffer",
                cursor, length
            )));
        }

        let opcode = Op::from_u32(raw_opcode as u32).ok_or_else(|| {
            Error::MalformedModule(format!("unknown opcode {}", raw_opcode))
        })?;
        let operand_words = &words[cursor + 1..cursor + length as usize];

        let string = carries_string(opcode).and_then(|start| {
            operand_words.get(start..).map(decode_string)
        });

        instructions.push(Instruction {
            opcode,
            operand_count: operand_words.len() as u16,
            operands: operand_words.to_vec(),
            string,
            length,
        });

        cursor += length as usize;
    }

    Ok((header, instructions))
}
