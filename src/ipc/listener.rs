//! Line-delimited JSON [`EventSource`] implementation.
//!
//! Reads any [`BufRead`] (stdin in the binary, a file, a socket) and parses
//! each line as a JSON-encoded [`HostEvent`].
//!
//! # Wire format
//!
//! Every message is a single line of JSON followed by `\n`.  Blank lines and
//! lines starting with `#` are skipped, so replay scripts can be commented:
//!
//! ```text
//! # two apps on a wide screen
//! {"Apps":["app-a","app-b"]}
//! {"Mount":{"width":1388,"height":516}}
//! {"Advance":{"ms":100}}
//! "Teardown"
//! ```

use crate::command::HostEvent;
use crate::traits::EventSource;
use log::{debug, error, info};
use std::io::BufRead;
use std::sync::mpsc;

/// An [`EventSource`] reading newline-delimited JSON events.
///
/// Malformed lines are logged and skipped; read errors end the source.
pub struct LineSource<R> {
    reader: R,
}

/// Errors produced by the line source.
#[derive(Debug, thiserror::Error)]
pub enum LineSourceError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl<R: BufRead> LineSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

/// Parse one line.  `Ok(None)` for blank and comment lines.
pub fn parse_line(line: &str) -> Result<Option<HostEvent>, LineSourceError> {
    let text = line.trim();
    if text.is_empty() || text.starts_with('#') {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(text)?))
}

impl<R: BufRead + Send> EventSource for LineSource<R> {
    type Error = LineSourceError;

    /// Read until end of input.
    ///
    /// This method **blocks** on the reader.  Run it on a dedicated thread.
    fn run(&mut self, sink: mpsc::Sender<HostEvent>) -> Result<(), Self::Error> {
        let mut line = String::new();
        let mut number = 0usize;
        loop {
            line.clear();
            if self.reader.read_line(&mut line)? == 0 {
                info!("input ended after {} lines", number);
                return Ok(());
            }
            number += 1;
            match parse_line(&line) {
                Ok(Some(event)) => {
                    debug!("received {:?}", event);
                    if sink.send(event).is_err() {
                        info!("sink closed, shutting down");
                        return Ok(());
                    }
                }
                Ok(None) => {}
                Err(e) => error!("bad event on line {}: {} ({})", number, line.trim(), e),
            }
        }
    }
}

//  Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Viewport;
    use std::io::{self, Cursor, Read};

    fn collect(input: &str) -> Vec<HostEvent> {
        let mut source = LineSource::new(Cursor::new(input.to_string()));
        let (tx, rx) = mpsc::channel();
        source.run(tx).unwrap();
        rx.try_iter().collect()
    }

    #[test]
    fn reads_events_in_order() {
        let events = collect(
            "{\"Apps\":[\"a\"]}\n{\"Mount\":{\"width\":1388,\"height\":516}}\n\"Teardown\"\n",
        );
        assert_eq!(
            events,
            vec![
                HostEvent::Apps(vec!["a".into()]),
                HostEvent::Mount(Viewport::new(1388.0, 516.0)),
                HostEvent::Teardown,
            ]
        );
    }

    #[test]
    fn skips_comments_blanks_and_malformed_lines() {
        let events = collect("# comment\n\nnot json at all\n{\"Advance\":{\"ms\":5}}");
        assert_eq!(events, vec![HostEvent::Advance { ms: 5 }]);
    }

    #[test]
    fn parse_line_reports_json_errors() {
        assert!(matches!(parse_line("{"), Err(LineSourceError::Json(_))));
        assert!(matches!(parse_line("   "), Ok(None)));
    }

    #[test]
    fn stops_when_sink_is_closed() {
        let mut source = LineSource::new(Cursor::new("\"Teardown\"\n\"Teardown\"\n".to_string()));
        let (tx, rx) = mpsc::channel();
        drop(rx);
        source.run(tx).unwrap();
    }

    struct Broken;

    impl Read for Broken {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "boom"))
        }
    }

    #[test]
    fn read_errors_end_the_source() {
        let mut source = LineSource::new(io::BufReader::new(Broken));
        let (tx, _rx) = mpsc::channel();
        assert!(matches!(source.run(tx), Err(LineSourceError::Io(_))));
    }
}
