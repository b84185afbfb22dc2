use std::io::{self, Write};

const BLOCK_LEN: usize = 16;

/// A marker is also written every this many zero blocks while a run lasts.
const ZERO_MARKER_EVERY: u64 = 10_000;

/// Hex dump of the captured byte stream, 16 bytes per line.
///
/// All-zero 16-byte blocks are not printed. A run of them is summarised as
/// `  (N)` with N the zero bytes seen in the run so far.
pub struct HexTrace<W: Write> {
    out: W,
    block: [u8; BLOCK_LEN],
    filled: usize,
    zero_blocks: u64,
}

impl<W: Write> HexTrace<W> {
    pub fn new(out: W) -> Self {
        HexTrace {
            out,
            block: [0; BLOCK_LEN],
            filled: 0,
            zero_blocks: 0,
        }
    }

    pub fn record(&mut self, bytes: &[u8]) -> io::Result<()> {
        for &byte in bytes {
            self.block[self.filled] = byte;
            self.filled += 1;
            if self.filled == BLOCK_LEN {
                self.filled = 0;
                self.emit_block()?;
            }
        }
        Ok(())
    }

    /// Closes an open zero run and prints any partial line.
    pub fn finish(&mut self) -> io::Result<()> {
        self.end_zero_run()?;
        if self.filled > 0 {
            let block = self.block;
            write_hex(&mut self.out, &block[..self.filled])?;
            self.filled = 0;
        }
        self.out.flush()
    }

    fn emit_block(&mut self) -> io::Result<()> {
        if self.block.iter().all(|&b| b == 0) {
            self.zero_blocks += 1;
            if self.zero_blocks % ZERO_MARKER_EVERY == 0 {
                writeln!(self.out, "  ({})", self.zero_blocks * BLOCK_LEN as u64)?;
            }
            return Ok(());
        }
        self.end_zero_run()?;
        let block = self.block;
        write_hex(&mut self.out, &block)
    }

    fn end_zero_run(&mut self) -> io::Result<()> {
        if self.zero_blocks % ZERO_MARKER_EVERY != 0 {
            writeln!(self.out, "  ({})", self.zero_blocks * BLOCK_LEN as u64)?;
        }
        self.zero_blocks = 0;
        Ok(())
    }
}

fn write_hex<W: Write>(out: &mut W, bytes: &[u8]) -> io::Result<()> {
    let line: Vec<String> = bytes.iter().map(|b| format!("{:02x}", b)).collect();
    writeln!(out, "{}", line.join(" "))
}
