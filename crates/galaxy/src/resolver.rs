//! History listing as a [`DestinationResolver`].

use std::future::Future;
use std::pin::Pin;

use gxupload_protocol::HistorySummary;
use gxupload_upload::{Destination, DestinationResolver, TransportError};

use crate::client::GalaxyClient;

/// Resolves destinations from the user's Galaxy histories.
#[derive(Debug, Clone)]
pub struct HistoryResolver {
    client: GalaxyClient,
}

impl HistoryResolver {
    pub fn new(client: GalaxyClient) -> Self {
        Self { client }
    }

    async fn histories(&self) -> Result<Vec<Destination>, TransportError> {
        let histories = self.client.list_histories().await?;
        Ok(histories.into_iter().map(to_destination).collect())
    }
}

fn to_destination(h: HistorySummary) -> Destination {
    Destination {
        id: h.id,
        name: h.name,
        update_time: h.update_time,
    }
}

impl DestinationResolver for HistoryResolver {
    fn list_destinations(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Destination>, TransportError>> + Send + '_>> {
        Box::pin(self.histories())
    }
}
