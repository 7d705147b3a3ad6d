//! Transport seam for flushing input reports
//!
//! The real controller protocol (pairing, HID/Bluetooth framing) lives behind
//! this trait; sessions without a backend use [`ConsoleTransport`].

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("transport is not connected")]
    NotConnected,
}

/// Report sink shared by the console and MIDI front-ends.
///
/// All methods take `&self` to support `Arc<dyn Transport>`; implementations
/// use interior mutability for their own state.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Write one input report. Fails with [`TransportError::NotConnected`]
    /// once the peer is gone; callers treat that as fatal to the session.
    async fn write(&self, report: &[u8]) -> Result<(), TransportError>;

    fn is_connected(&self) -> bool {
        true
    }
}

/// Logs every report instead of delivering it anywhere.
///
/// Useful for exercising command dispatch and MIDI translation without a
/// paired console.
#[derive(Debug, Default)]
pub struct ConsoleTransport {
    reports_written: AtomicU64,
}

impl ConsoleTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports_written(&self) -> u64 {
        self.reports_written.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Transport for ConsoleTransport {
    async fn write(&self, report: &[u8]) -> Result<(), TransportError> {
        let n = self.reports_written.fetch_add(1, Ordering::Relaxed) + 1;
        debug!("report #{}: {:02X?}", n, report);
        Ok(())
    }
}

#[cfg(test)]
pub mod testing {
    //! Transport doubles for unit tests

    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use parking_lot::Mutex;

    use super::{Transport, TransportError};

    /// Records every report; can be flipped to disconnected mid-test.
    #[derive(Debug, Default)]
    pub struct RecordingTransport {
        reports: Mutex<Vec<Vec<u8>>>,
        disconnected: AtomicBool,
    }

    impl RecordingTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn reports(&self) -> Vec<Vec<u8>> {
            self.reports.lock().clone()
        }

        pub fn disconnect(&self) {
            self.disconnected.store(true, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn write(&self, report: &[u8]) -> Result<(), TransportError> {
            if self.disconnected.load(Ordering::SeqCst) {
                return Err(TransportError::NotConnected);
            }
            self.reports.lock().push(report.to_vec());
            Ok(())
        }

        fn is_connected(&self) -> bool {
            !self.disconnected.load(Ordering::SeqCst)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_console_transport_counts_reports() {
        let transport = ConsoleTransport::new();
        transport.write(&[0, 0, 0]).await.unwrap();
        transport.write(&[1, 0, 0]).await.unwrap();
        assert_eq!(transport.reports_written(), 2);
    }

    #[tokio::test]
    async fn test_recording_transport_disconnect() {
        let transport = testing::RecordingTransport::new();
        transport.write(&[0]).await.unwrap();
        transport.disconnect();
        assert_eq!(
            transport.write(&[1]).await,
            Err(TransportError::NotConnected)
        );
        assert_eq!(transport.reports().len(), 1);
    }
}
