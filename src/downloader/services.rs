//! Background service starters.

use crate::retention::RetentionSweeper;

use super::MediaDownloader;

impl MediaDownloader {
    /// Start the retention sweeper background task
    ///
    /// The task stops when [`MediaDownloader::shutdown`] is called.
    pub fn start_sweeper(&self) -> tokio::task::JoinHandle<()> {
        let sweeper = RetentionSweeper::new(self.clone());

        let handle = tokio::spawn(async move {
            sweeper.run().await;
        });

        tracing::info!("Retention sweeper background task started");

        handle
    }
}
