//! Request-scoped logger handle.

use std::fmt;

const KNOWN_FIELDS: [&str; 3] = ["service", "function", "request_id"];

macro_rules! emit {
    ($level:ident, $logger:expr, $message:expr) => {{
        let extra = $logger.extra();
        tracing::$level!(
            service = $logger.field("service"),
            function = $logger.field("function"),
            request_id = $logger.field("request_id"),
            fields = extra.as_deref().map(tracing::field::display),
            "{}",
            $message
        )
    }};
}

/// A logger carrying key/value fields that are attached to every event.
///
/// Cloning yields an independent copy: fields set on the copy never show up
/// on the original, which is what keeps one invocation's fields out of
/// another's.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Logger {
    fields: Vec<(String, String)>,
}

impl Logger {
    /// Create a logger with no fields.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the logger with `key` set to `value`.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_field(key, value);
        self
    }

    /// Set `key` to `value`, overwriting an existing value for `key`.
    pub fn set_field(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.fields.push((key, value)),
        }
    }

    /// Look up a field value.
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// All fields in insertion order.
    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    /// Fields other than `service`, `function` and `request_id`, which are
    /// emitted as event fields of their own.
    fn extra(&self) -> Option<String> {
        let extra: Vec<(String, String)> = self
            .fields
            .iter()
            .filter(|(k, _)| !KNOWN_FIELDS.contains(&k.as_str()))
            .cloned()
            .collect();
        if extra.is_empty() {
            None
        } else {
            Some(Fields(&extra).to_string())
        }
    }

    pub fn debug(&self, message: impl fmt::Display) {
        emit!(debug, self, message);
    }

    pub fn info(&self, message: impl fmt::Display) {
        emit!(info, self, message);
    }

    pub fn warn(&self, message: impl fmt::Display) {
        emit!(warn, self, message);
    }

    pub fn error(&self, message: impl fmt::Display) {
        emit!(error, self, message);
    }
}

struct Fields<'a>(&'a [(String, String)]);

impl fmt::Display for Fields<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}={}", key, value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_field_overwrites() {
        let mut logger = Logger::new().with_field("a", "1");
        logger.set_field("a", "2");
        logger.set_field("b", "3");

        assert_eq!(logger.field("a"), Some("2"));
        assert_eq!(logger.field("b"), Some("3"));
        assert_eq!(logger.fields().len(), 2);
    }

    #[test]
    fn test_copy_does_not_leak_fields() {
        let base = Logger::new().with_field("service", "funcgate");
        let mut copy = base.clone();
        copy.set_field("request_id", "abc");

        assert_eq!(base.field("request_id"), None);
        assert_eq!(copy.field("service"), Some("funcgate"));
    }

    #[test]
    fn test_fields_display() {
        let logger = Logger::new().with_field("a", "1").with_field("b", "2");
        assert_eq!(Fields(logger.fields()).to_string(), "a=1 b=2");
    }

    #[derive(Clone, Default)]
    struct SharedBuf(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_fields_are_structured() {
        let buf = SharedBuf::default();
        let writer = buf.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(move || writer.clone())
            .finish();

        let logger = Logger::new()
            .with_field("service", "funcgate")
            .with_field("request_id", "req-1")
            .with_field("attempt", "2");
        tracing::subscriber::with_default(subscriber, || logger.info("handled"));

        let output = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("handled"), "{}", output);
        assert!(output.contains("service=\"funcgate\""), "{}", output);
        assert!(output.contains("request_id=\"req-1\""), "{}", output);
        assert!(output.contains("fields=attempt=2"), "{}", output);
        assert!(!output.contains("function="), "{}", output);
    }
}
