//! Value-change-dump output for the bench.
//!
//! Writes a header built from the circuit's port list, then timestamped
//! change records.  Kept deliberately small: two-state values and a single
//! flat scope are all the circuits this bench drives ever need.

use std::fs::{self, File};
use std::io::{BufWriter, Write};

use camino::{Utf8Path, Utf8PathBuf};

use crate::dut::PortDesc;
use crate::error::{EnvError, Result};

/// Short identifier code for variable `index`.  VCD identifiers are strings
/// over the printable ASCII range `!`..=`~`.
fn ident(index: usize) -> String {
    let mut code = String::new();
    let mut i = index;
    loop {
        code.push(char::from(b'!' + (i % 94) as u8));
        i /= 94;
        if i == 0 {
            break;
        }
    }
    code
}

#[derive(Debug)]
pub struct VcdWriter {
    path: Utf8PathBuf,
    out: Option<BufWriter<File>>,
    widths: Vec<u32>,
    /// Last dumped value per variable; `None` until the first record.
    last: Vec<Option<u64>>,
}

impl VcdWriter {
    /// Create `<dir>/<module>.vcd` and write the declaration header.
    pub fn create(dir: &Utf8Path, module: &str, ports: &[PortDesc]) -> Result<Self> {
        let path = dir.join(format!("{module}.vcd"));
        let file = fs::create_dir_all(dir)
            .and_then(|()| File::create(path.as_std_path()))
            .map_err(|source| EnvError::TraceOpen {
                path: path.clone(),
                source,
            })?;

        let mut writer = VcdWriter {
            path,
            out: Some(BufWriter::new(file)),
            widths: ports.iter().map(|p| p.width).collect(),
            last: vec![None; ports.len()],
        };
        writer.emit(|out| {
            writeln!(out, "$timescale 1ns $end")?;
            writeln!(out, "$scope module {module} $end")?;
            for (i, port) in ports.iter().enumerate() {
                writeln!(
                    out,
                    "$var wire {} {} {} $end",
                    port.width,
                    ident(i),
                    port.name
                )?;
            }
            writeln!(out, "$upscope $end")?;
            writeln!(out, "$enddefinitions $end")
        })?;
        Ok(writer)
    }

    /// Record the given signal values at `time`.  The first record dumps
    /// every variable; later records only emit what changed.
    pub fn dump(&mut self, time: u64, values: &[u64]) -> Result<()> {
        debug_assert_eq!(values.len(), self.last.len());
        let first = self.last.first().is_some_and(|v| v.is_none());
        let mut changes = Vec::new();
        for (i, &value) in values.iter().enumerate() {
            let value = mask(value, self.widths[i]);
            if self.last[i] != Some(value) {
                self.last[i] = Some(value);
                if self.widths[i] == 1 {
                    changes.push(format!("{}{}", value & 1, ident(i)));
                } else {
                    changes.push(format!("b{:b} {}", value, ident(i)));
                }
            }
        }

        self.emit(|out| {
            writeln!(out, "#{time}")?;
            if first {
                writeln!(out, "$dumpvars")?;
            }
            for change in &changes {
                writeln!(out, "{change}")?;
            }
            if first {
                writeln!(out, "$end")?;
            }
            Ok(())
        })
    }

    /// Push buffered records out to the file.
    pub fn flush(&mut self) -> Result<()> {
        self.emit(|out| out.flush())
    }

    /// Flush and release the file handle.  Further dumps are rejected.
    pub fn close(&mut self) -> Result<()> {
        if let Some(mut out) = self.out.take() {
            out.flush().map_err(|source| EnvError::TraceWrite {
                path: self.path.clone(),
                source,
            })?;
        }
        Ok(())
    }

    fn emit<F>(&mut self, write: F) -> Result<()>
    where
        F: FnOnce(&mut BufWriter<File>) -> std::io::Result<()>,
    {
        let out = self.out.as_mut().ok_or_else(|| EnvError::TraceWrite {
            path: self.path.clone(),
            source: std::io::Error::new(std::io::ErrorKind::Other, "trace already closed"),
        })?;
        Ok(write(out).map_err(|source| EnvError::TraceWrite {
            path: self.path.clone(),
            source,
        })?)
    }
}

impl Drop for VcdWriter {
    fn drop(&mut self) {
        // Best effort; errors on the explicit close path are already fatal.
        let _ = self.close();
    }
}

fn mask(value: u64, width: u32) -> u64 {
    if width >= 64 {
        value
    } else {
        value & ((1u64 << width) - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ident_codes_are_printable_and_distinct() {
        let codes: Vec<String> = (0..200).map(ident).collect();
        for code in &codes {
            assert!(code.bytes().all(|b| (b'!'..=b'~').contains(&b)));
        }
        for (i, a) in codes.iter().enumerate() {
            for b in &codes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn mask_clips_to_width() {
        assert_eq!(mask(0xff, 1), 1);
        assert_eq!(mask(0x1ff, 8), 0xff);
        assert_eq!(mask(u64::MAX, 64), u64::MAX);
    }
}
