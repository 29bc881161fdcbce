//! Shutdown coordination.

use crate::error::Result;
use crate::types::Event;

use super::MediaDownloader;

/// How long shutdown waits for in-flight extractor calls
const SHUTDOWN_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

impl MediaDownloader {
    /// Gracefully shut down the downloader
    ///
    /// This method performs a graceful shutdown sequence:
    /// 1. Stops accepting new jobs
    /// 2. Stops the retention sweeper
    /// 3. Waits for in-flight extractor calls with a timeout (30 seconds)
    /// 4. Emits [`Event::Shutdown`]
    ///
    /// Extractor processes still running when the process exits are killed
    /// with their handles.
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!("Initiating graceful shutdown");

        // 1. Stop accepting new jobs
        self.accepting_new
            .store(false, std::sync::atomic::Ordering::SeqCst);
        tracing::info!("Stopped accepting new jobs");

        // 2. Stop the sweeper
        self.sweep.cancel.cancel();

        // 3. Every permit back in the semaphore means no extractor call is running
        let permits = u32::try_from(self.config.download.max_concurrent_downloads)
            .unwrap_or(u32::MAX);
        match tokio::time::timeout(SHUTDOWN_TIMEOUT, self.concurrency.acquire_many(permits)).await
        {
            Ok(Ok(_all)) => {
                tracing::info!("All in-flight jobs completed");
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Error while waiting for in-flight jobs");
            }
            Err(_) => {
                tracing::warn!("Timeout waiting for in-flight jobs, proceeding with shutdown");
            }
        }

        // 4. Emit shutdown event
        self.emit_event(Event::Shutdown);

        tracing::info!("Graceful shutdown complete");
        Ok(())
    }

    /// Whether new jobs are still accepted
    pub fn is_accepting(&self) -> bool {
        self.accepting_new
            .load(std::sync::atomic::Ordering::SeqCst)
    }
}
