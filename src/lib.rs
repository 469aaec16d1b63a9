use log::info;
use std::io::BufRead;

pub mod aggregate;
pub mod extract;
pub mod report;
pub mod source;

pub use aggregate::{AggregateState, Aggregator, FrequencyTable, RankedEntry};
pub use extract::Extraction;
pub use source::{Source, SourceError, SourceKind};

/// Feed every line of `reader` into `aggregator`, in order.
/// Lines end at `\n`, `\r\n` or a lone `\r`, and invalid UTF-8 is replaced rather than rejected,
/// so the only possible failure is the reader itself failing.
pub fn analyze<R: BufRead>(mut reader: R, aggregator: &mut Aggregator) -> Result<(), SourceError> {
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(());
        }
        let terminated = buf.last() == Some(&b'\n');
        if terminated {
            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
        }
        let mut lines: Vec<_> = buf.split(|&b| b == b'\r').collect();
        // At end of input a trailing lone `\r` ends the last line rather than starting an empty one
        if !terminated && buf.last() == Some(&b'\r') {
            lines.pop();
        }
        for line in lines {
            aggregator.observe(&String::from_utf8_lossy(line));
        }
    }
}

/// Open `path` (see [`source::open`]) and aggregate all of it.
pub fn analyze_path(path: impl AsRef<std::path::Path>, max_size: Option<u64>) -> Result<AggregateState, SourceError> {
    let Source { kind, reader } = source::open(path, max_size)?;
    info!("analyzing {}", kind);
    let mut aggregator = Aggregator::new();
    analyze(reader, &mut aggregator)?;
    let state = aggregator.finish();
    info!("finished {}: {} lines", kind, state.total_requests());
    Ok(state)
}
