use encoding_rs::{CoderResult, Decoder, DecoderResult, UTF_8};

/// How malformed UTF-8 in the stream is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodeMode {
    /// Malformed sequences become U+FFFD.
    #[default]
    Replace,
    /// Malformed sequences are an error.
    Strict,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("malformed utf-8 sequence at byte {offset}")]
    Malformed { offset: u64 },
    #[error("stream ended inside a multi-byte utf-8 sequence")]
    Truncated,
}

/// UTF-8 decoder that carries partial multi-byte sequences from one chunk to the next.
///
/// One instance must see every chunk of a stream, in order. A character whose
/// bytes straddle two chunks is produced by the call that receives its last byte.
pub struct Utf8StreamDecoder {
    decoder: Decoder,
    mode: DecodeMode,
    consumed: u64,
    finished: bool,
}

impl Utf8StreamDecoder {
    pub fn new(mode: DecodeMode) -> Self {
        Self {
            decoder: UTF_8.new_decoder_with_bom_removal(),
            mode,
            consumed: 0,
            finished: false,
        }
    }

    pub fn mode(&self) -> DecodeMode {
        self.mode
    }

    /// Total bytes fed so far.
    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    /// Decodes one chunk. Bytes of an incomplete trailing character are held back.
    pub fn decode(&mut self, chunk: &[u8]) -> Result<String, DecodeError> {
        self.run(chunk, false)
    }

    /// Flushes whatever is held back at end of stream. The decoder is spent afterwards.
    pub fn finish(&mut self) -> Result<String, DecodeError> {
        if self.finished {
            return Ok(String::new());
        }
        self.finished = true;
        self.run(&[], true).map_err(|err| match err {
            DecodeError::Malformed { .. } => DecodeError::Truncated,
            other => other,
        })
    }

    fn run(&mut self, chunk: &[u8], last: bool) -> Result<String, DecodeError> {
        let text = match self.mode {
            DecodeMode::Replace => self.decode_replacing(chunk, last),
            DecodeMode::Strict => self.decode_strict(chunk, last)?,
        };
        self.consumed += chunk.len() as u64;
        Ok(text)
    }

    fn decode_replacing(&mut self, mut input: &[u8], last: bool) -> String {
        let mut out = String::new();
        loop {
            reserve_for(&mut out, self.decoder.max_utf8_buffer_length(input.len()));
            let (result, read, _had_replacements) =
                self.decoder.decode_to_string(input, &mut out, last);
            input = &input[read..];
            match result {
                CoderResult::InputEmpty => return out,
                CoderResult::OutputFull => continue,
            }
        }
    }

    fn decode_strict(&mut self, chunk: &[u8], last: bool) -> Result<String, DecodeError> {
        let mut out = String::new();
        let mut input = chunk;
        loop {
            reserve_for(
                &mut out,
                self.decoder
                    .max_utf8_buffer_length_without_replacement(input.len()),
            );
            let (result, read) =
                self.decoder
                    .decode_to_string_without_replacement(input, &mut out, last);
            input = &input[read..];
            match result {
                DecoderResult::InputEmpty => return Ok(out),
                DecoderResult::OutputFull => continue,
                DecoderResult::Malformed(bad, extra) => {
                    let read_so_far = (chunk.len() - input.len()) as u64;
                    // The bad sequence may have started in an earlier chunk.
                    let offset = (self.consumed + read_so_far)
                        .saturating_sub(u64::from(bad) + u64::from(extra));
                    return Err(DecodeError::Malformed { offset });
                }
            }
        }
    }
}

fn reserve_for(out: &mut String, needed: Option<usize>) {
    // Overflow only happens for absurd inputs; grow in steps instead.
    out.reserve(needed.unwrap_or(8 * 1024));
}
