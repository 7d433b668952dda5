//! Wire-level protocol trace sink.

/// Receives every protocol line the session sends or reads.
///
/// Implementations decide where the transcript goes; the session itself
/// never writes trace output directly.
pub trait Trace: Send {
    /// Records one protocol line. `outbound` is true for client commands.
    fn line(&mut self, outbound: bool, text: &str);
}

/// Trace sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTrace;

impl Trace for NullTrace {
    fn line(&mut self, _outbound: bool, _text: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder(Vec<String>);

    impl Trace for Recorder {
        fn line(&mut self, outbound: bool, text: &str) {
            let prefix = if outbound { ">> " } else { "<< " };
            self.0.push(format!("{prefix}{text}"));
        }
    }

    #[test]
    fn records_direction() {
        let mut rec = Recorder::default();
        rec.line(true, "EHLO client.example.com");
        rec.line(false, "250 OK");
        assert_eq!(rec.0, vec![">> EHLO client.example.com", "<< 250 OK"]);
    }
}
